use rustfft::{num_complex::Complex, FftPlanner};
use std::iter::Enumerate;
use std::vec::IntoIter;

use crate::input::Waveform;

/// One FFT bin: center frequency and magnitude of the complex coefficient
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumSample {
    pub frequency: f64,
    pub magnitude: f64,
}

/// Full-length forward FFT of a waveform, yielded bin by bin.
///
/// Covers every bin 0..N (not just up to Nyquist). Consumed once; call
/// `spectrum` again for a fresh pass.
pub struct Spectrum {
    bins: Enumerate<IntoIter<Complex<f64>>>,
    bin_width: f64,
}

impl Spectrum {
    /// Frequency spacing between bins, `sample_rate / N`
    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }
}

impl Iterator for Spectrum {
    type Item = SpectrumSample;

    fn next(&mut self) -> Option<SpectrumSample> {
        self.bins.next().map(|(k, c)| SpectrumSample {
            frequency: k as f64 * self.bin_width,
            magnitude: c.norm(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.bins.size_hint()
    }
}

impl ExactSizeIterator for Spectrum {}

/// Forward transform of `waveform`, unwindowed and unscaled
pub fn spectrum(waveform: &Waveform) -> Spectrum {
    let n = waveform.len();
    let mut buffer: Vec<Complex<f64>> = waveform
        .samples()
        .iter()
        .map(|&s| Complex::new(s, 0.0))
        .collect();

    if n > 0 {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n);
        fft.process(&mut buffer);
    }

    let bin_width = if n > 0 {
        waveform.sample_rate() as f64 / n as f64
    } else {
        0.0
    };

    Spectrum {
        bins: buffer.into_iter().enumerate(),
        bin_width,
    }
}

/// Strongest bin below Nyquist, skipping DC. `None` if there is no such bin.
pub fn dominant_frequency<I>(spectrum: I) -> Option<SpectrumSample>
where
    I: ExactSizeIterator<Item = SpectrumSample>,
{
    let half = spectrum.len() / 2;
    spectrum
        .take(half)
        .skip(1)
        .max_by(|a, b| a.magnitude.total_cmp(&b.magnitude))
}
