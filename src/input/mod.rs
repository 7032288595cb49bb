pub mod wav;

use crate::error::{DemuxError, Result};

/// Mono buffer of real samples at a fixed rate
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    sample_rate: u32,
    samples: Vec<f64>,
}

impl Waveform {
    /// Build a waveform, rejecting a zero rate or non-finite samples
    pub fn new(sample_rate: u32, samples: Vec<f64>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(DemuxError::InvalidWaveform("sample rate must be positive".into()));
        }
        if let Some(index) = samples.iter().position(|s| !s.is_finite()) {
            return Err(DemuxError::InvalidWaveform(format!(
                "sample {} is not finite ({})",
                index, samples[index]
            )));
        }
        Ok(Self { sample_rate, samples })
    }

    /// Same rate, new samples. Used by stages whose output is finite by construction.
    pub(crate) fn with_samples(&self, samples: Vec<f64>) -> Self {
        Self {
            sample_rate: self.sample_rate,
            samples,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Largest absolute sample value, 0.0 for an empty buffer
    pub fn peak(&self) -> f64 {
        self.samples.iter().fold(0.0f64, |acc, s| acc.max(s.abs()))
    }

    /// Time of each sample in seconds (`index / sample_rate`)
    pub fn time_axis(&self) -> impl Iterator<Item = f64> + '_ {
        let rate = self.sample_rate as f64;
        (0..self.samples.len()).map(move |n| n as f64 / rate)
    }
}

/// Samples as delivered by a source, possibly interleaved across channels
#[derive(Debug, Clone)]
pub struct RawAudio {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f64>,
}

impl RawAudio {
    /// Collapse to a mono waveform by keeping channel 0
    pub fn into_waveform(self) -> Result<Waveform> {
        let samples = if self.channels > 1 {
            self.samples
                .into_iter()
                .step_by(self.channels as usize)
                .collect()
        } else {
            self.samples
        };
        Waveform::new(self.sample_rate, samples)
    }
}

/// Anything that can hand the pipeline a complete recording
pub trait WaveformSource {
    fn read(&mut self) -> Result<RawAudio>;
}
