use hound::{SampleFormat, WavReader};
use std::io::Read;
use std::path::{Path, PathBuf};

use super::{RawAudio, WaveformSource};
use crate::error::{DemuxError, Result};

/// Reads a WAV file (any channel count, integer or float PCM)
pub struct WavSource {
    path: PathBuf,
}

impl WavSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn read_wav(&self) -> std::result::Result<RawAudio, hound::Error> {
        let reader = WavReader::open(&self.path)?;
        let spec = reader.spec();

        let samples = match spec.sample_format {
            SampleFormat::Float => read_float_samples(reader)?,
            SampleFormat::Int => read_int_samples(reader, spec.bits_per_sample)?,
        };

        Ok(RawAudio {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }
}

impl WaveformSource for WavSource {
    fn read(&mut self) -> Result<RawAudio> {
        self.read_wav().map_err(|source| DemuxError::SourceReadFailure {
            path: self.path.clone(),
            source,
        })
    }
}

fn read_float_samples<R: Read>(
    mut reader: WavReader<R>,
) -> std::result::Result<Vec<f64>, hound::Error> {
    reader
        .samples::<f32>()
        .map(|s| s.map(f64::from))
        .collect()
}

fn read_int_samples<R: Read>(
    mut reader: WavReader<R>,
    bits: u16,
) -> std::result::Result<Vec<f64>, hound::Error> {
    let max_val = (1i64 << (bits - 1)) as f64;
    reader
        .samples::<i32>()
        .map(|s| s.map(|v| v as f64 / max_val))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    #[test]
    fn test_reads_stereo_int16() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 40000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for v in [16384i16, -100, -16384, 100] {
            writer.write_sample(v).unwrap();
        }
        writer.finalize().unwrap();

        let raw = WavSource::new(&path).read().unwrap();
        assert_eq!(raw.sample_rate, 40000);
        assert_eq!(raw.channels, 2);
        assert_eq!(raw.samples.len(), 4);

        let mono = raw.into_waveform().unwrap();
        assert_eq!(mono.samples(), &[0.5, -0.5]);
    }

    #[test]
    fn test_reads_float32() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0.25f32).unwrap();
        writer.write_sample(-0.75f32).unwrap();
        writer.finalize().unwrap();

        let raw = WavSource::new(&path).read().unwrap();
        assert_eq!(raw.samples, vec![0.25, -0.75]);
    }

    #[test]
    fn test_missing_file_is_source_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.wav");
        let err = WavSource::new(&path).read().unwrap_err();
        assert!(matches!(err, DemuxError::SourceReadFailure { .. }));
        assert!(err.to_string().contains("missing.wav"));
    }
}
