use chrono::{DateTime, Local};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;

use crate::error::{DemuxError, Result};
use crate::input::Waveform;

/// Bit depth of exported voice files
pub const BITS_PER_SAMPLE: u16 = 16;

/// Full-scale factor for float to int16 conversion
const PCM_SCALE: f64 = 32767.0;

/// Convert to int16 PCM as `round(s * 32767)`, clipped to the i16 range
pub fn quantize(waveform: &Waveform) -> Vec<i16> {
    waveform
        .samples()
        .iter()
        .map(|s| (s * PCM_SCALE).round().clamp(i16::MIN as f64, i16::MAX as f64) as i16)
        .collect()
}

/// Anything that can persist pre-quantized PCM
pub trait WaveformSink {
    fn write(&mut self, path: &Path, sample_rate: u32, samples: &[i16]) -> Result<()>;
}

/// Writes mono 16-bit PCM WAV files
#[derive(Debug, Default)]
pub struct WavSink;

impl WavSink {
    fn write_wav(
        path: &Path,
        sample_rate: u32,
        samples: &[i16],
    ) -> std::result::Result<(), hound::Error> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: BITS_PER_SAMPLE,
            sample_format: SampleFormat::Int,
        };

        let mut writer = WavWriter::create(path, spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()
    }
}

impl WaveformSink for WavSink {
    fn write(&mut self, path: &Path, sample_rate: u32, samples: &[i16]) -> Result<()> {
        Self::write_wav(path, sample_rate, samples).map_err(|source| DemuxError::SinkWriteFailure {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Output file name for a voice, e.g. `voice1.wav` or
/// `voice1_2024-05-01_12-00-00.wav` when stamped
pub fn output_filename(stem: &str, timestamp: Option<DateTime<Local>>) -> String {
    match timestamp {
        Some(time) => format!("{}_{}.wav", stem, time.format("%Y-%m-%d_%H-%M-%S")),
        None => format!("{}.wav", stem),
    }
}
