pub mod design;

use rustfft::num_complex::Complex64;
use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::input::Waveform;

pub use design::design;

/// Which response a filter design targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Lowpass,
    Bandpass,
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKind::Lowpass => write!(f, "lowpass"),
            FilterKind::Bandpass => write!(f, "bandpass"),
        }
    }
}

/// Cutoff frequencies in Hz
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterBand {
    Lowpass { cutoff_hz: f64 },
    Bandpass { low_hz: f64, high_hz: f64 },
}

/// Design descriptor for a Butterworth IIR filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSpec {
    pub band: FilterBand,
    pub order: usize,
    pub sample_rate: u32,
}

impl FilterSpec {
    pub fn lowpass(order: usize, cutoff_hz: f64, sample_rate: u32) -> Self {
        Self {
            band: FilterBand::Lowpass { cutoff_hz },
            order,
            sample_rate,
        }
    }

    pub fn bandpass(order: usize, low_hz: f64, high_hz: f64, sample_rate: u32) -> Self {
        Self {
            band: FilterBand::Bandpass { low_hz, high_hz },
            order,
            sample_rate,
        }
    }

    pub fn kind(&self) -> FilterKind {
        match self.band {
            FilterBand::Lowpass { .. } => FilterKind::Lowpass,
            FilterBand::Bandpass { .. } => FilterKind::Bandpass,
        }
    }

    pub fn nyquist(&self) -> f64 {
        self.sample_rate as f64 / 2.0
    }
}

/// One second-order section, `a0` normalized to 1
///
/// H(z) = (b0 + b1*z^-1 + b2*z^-2) / (1 + a1*z^-1 + a2*z^-2)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Biquad {
    pub b: [f64; 3],
    pub a: [f64; 2],
}

impl Biquad {
    pub fn new(b: [f64; 3], a: [f64; 2]) -> Self {
        Self { b, a }
    }

    /// Both poles strictly inside the unit circle (stability triangle)
    pub fn is_stable(&self) -> bool {
        let [a1, a2] = self.a;
        a2.abs() < 1.0 && a1.abs() < 1.0 + a2
    }

    fn response(&self, z_inv: Complex64) -> Complex64 {
        let z_inv2 = z_inv * z_inv;
        let num = self.b[0] + z_inv * self.b[1] + z_inv2 * self.b[2];
        let den = 1.0 + z_inv * self.a[0] + z_inv2 * self.a[1];
        num / den
    }
}

/// Immutable cascade of second-order sections
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCoefficients {
    sections: Vec<Biquad>,
}

impl FilterCoefficients {
    pub fn new(sections: Vec<Biquad>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[Biquad] {
        &self.sections
    }

    /// Every section's poles lie inside the unit circle. Designs are checked
    /// against this in debug builds.
    pub fn is_stable(&self) -> bool {
        self.sections.iter().all(Biquad::is_stable)
    }

    /// Complex response of the cascade at `freq_hz`, for inspecting a design
    /// (not used on the processing path)
    pub fn frequency_response(&self, freq_hz: f64, sample_rate: u32) -> Complex64 {
        let w = 2.0 * PI * freq_hz / sample_rate as f64;
        let z_inv = Complex64::from_polar(1.0, -w);
        self.sections
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, s| acc * s.response(z_inv))
    }

    /// `|H(f)|`, e.g. 1/sqrt(2) at a Butterworth cutoff
    pub fn magnitude_at(&self, freq_hz: f64, sample_rate: u32) -> f64 {
        self.frequency_response(freq_hz, sample_rate).norm()
    }
}

/// Run `waveform` through the cascade from a zero initial state.
///
/// Each section is evaluated in transposed direct form II, section by section
/// over the whole buffer. Output has the input's length and rate.
pub fn apply(coefficients: &FilterCoefficients, waveform: &Waveform) -> Waveform {
    let mut buffer = waveform.samples().to_vec();
    for section in coefficients.sections() {
        filter_section(section, &mut buffer);
    }
    waveform.with_samples(buffer)
}

fn filter_section(section: &Biquad, buffer: &mut [f64]) {
    let [b0, b1, b2] = section.b;
    let [a1, a2] = section.a;
    let (mut s1, mut s2) = (0.0, 0.0);

    for x in buffer.iter_mut() {
        let input = *x;
        let y = b0 * input + s1;
        s1 = b1 * input - a1 * y + s2;
        s2 = b2 * input - a2 * y;
        *x = y;
    }
}

/// Designs each distinct spec once and hands out shared coefficients
#[derive(Debug, Default)]
pub struct FilterBank {
    designs: Vec<(FilterSpec, Arc<FilterCoefficients>)>,
}

impl FilterBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coefficients(&mut self, spec: &FilterSpec) -> Result<Arc<FilterCoefficients>> {
        if let Some((_, coefficients)) = self.designs.iter().find(|(s, _)| s == spec) {
            return Ok(Arc::clone(coefficients));
        }

        let coefficients = Arc::new(design(spec)?);
        log::debug!(
            "designed {} filter: order {}, {:?}, {} sections",
            spec.kind(),
            spec.order,
            spec.band,
            coefficients.sections().len()
        );
        self.designs.push((*spec, Arc::clone(&coefficients)));
        Ok(coefficients)
    }

    /// Number of distinct designs held
    pub fn len(&self) -> usize {
        self.designs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.designs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f64, rate: u32, len: usize) -> Waveform {
        let samples = (0..len)
            .map(|n| (2.0 * PI * freq * n as f64 / rate as f64).sin())
            .collect();
        Waveform::new(rate, samples).unwrap()
    }

    #[test]
    fn test_preserves_length_and_rate() {
        let lp = design(&FilterSpec::lowpass(4, 4000.0, 40000)).unwrap();
        let bp = design(&FilterSpec::bandpass(4, 6000.0, 10000.0, 40000)).unwrap();
        for len in [1, 2, 17, 1000] {
            let input = tone(1000.0, 40000, len);
            for coefficients in [&lp, &bp] {
                let out = apply(coefficients, &input);
                assert_eq!(out.len(), len);
                assert_eq!(out.sample_rate(), 40000);
            }
        }
    }

    #[test]
    fn test_zero_length_input() {
        let lp = design(&FilterSpec::lowpass(4, 4000.0, 40000)).unwrap();
        let empty = Waveform::new(40000, vec![]).unwrap();
        assert!(apply(&lp, &empty).is_empty());
    }

    #[test]
    fn test_single_sample_is_first_impulse_response_tap() {
        let lp = design(&FilterSpec::lowpass(4, 4000.0, 40000)).unwrap();
        let impulse = Waveform::new(40000, vec![1.0]).unwrap();
        let out = apply(&lp, &impulse);
        let b0: f64 = lp.sections().iter().map(|s| s.b[0]).product();
        assert!((out.samples()[0] - b0).abs() < 1e-12);
    }

    #[test]
    fn test_lowpass_dc_gain_settles_to_one() {
        let lp = design(&FilterSpec::lowpass(4, 4000.0, 40000)).unwrap();
        let dc = Waveform::new(40000, vec![1.0; 2000]).unwrap();
        let out = apply(&lp, &dc);
        assert!((out.samples()[1999] - 1.0).abs() < 1e-9);
    }

    fn rms(samples: &[f64]) -> f64 {
        (samples.iter().map(|s| s * s).sum::<f64>() / samples.len() as f64).sqrt()
    }

    #[test]
    fn test_bandpass_passes_center_rejects_other_carrier() {
        let bp = design(&FilterSpec::bandpass(4, 6000.0, 10000.0, 40000)).unwrap();
        let settle = 2000;

        let passed = apply(&bp, &tone(8000.0, 40000, 8000));
        let passed_rms = rms(&passed.samples()[settle..]);
        assert!((passed_rms - 0.5f64.sqrt()).abs() < 0.01);

        let rejected = apply(&bp, &tone(16000.0, 40000, 8000));
        assert!(rms(&rejected.samples()[settle..]) < 0.01);
    }

    #[test]
    fn test_filter_bank_reuses_designs() {
        let mut bank = FilterBank::new();
        let spec = FilterSpec::lowpass(4, 4000.0, 40000);
        let first = bank.coefficients(&spec).unwrap();
        let second = bank.coefficients(&spec).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(bank.len(), 1);

        bank.coefficients(&FilterSpec::bandpass(4, 6000.0, 10000.0, 40000))
            .unwrap();
        assert_eq!(bank.len(), 2);
    }

    #[test]
    fn test_filter_bank_does_not_cache_failures() {
        let mut bank = FilterBank::new();
        assert!(bank
            .coefficients(&FilterSpec::lowpass(4, 30000.0, 40000))
            .is_err());
        assert!(bank.is_empty());
    }
}
