use crate::input::Waveform;
use crate::spectrum::{dominant_frequency, Spectrum};

/// Observer for the named signals a run produces. Never feeds back into the
/// pipeline.
pub trait Reporter {
    fn time_series(&mut self, name: &str, waveform: &Waveform);
    fn spectrum(&mut self, name: &str, spectrum: Spectrum);
}

/// Summarizes each series through the `log` facade
#[derive(Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn time_series(&mut self, name: &str, waveform: &Waveform) {
        log::info!(
            "{}: {} samples, {:.2}s, peak amplitude {:.4}",
            name,
            waveform.len(),
            waveform.duration_secs(),
            waveform.peak()
        );
    }

    fn spectrum(&mut self, name: &str, spectrum: Spectrum) {
        let bin_width = spectrum.bin_width();
        match dominant_frequency(spectrum) {
            Some(peak) => log::info!(
                "{}: dominant {:.1} Hz (magnitude {:.1}, {:.3} Hz bins)",
                name,
                peak.frequency,
                peak.magnitude,
                bin_width
            ),
            None => log::info!("{}: too short for a spectrum", name),
        }
    }
}

#[derive(Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn time_series(&mut self, _name: &str, _waveform: &Waveform) {}
    fn spectrum(&mut self, _name: &str, _spectrum: Spectrum) {}
}
