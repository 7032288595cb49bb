use chrono::Local;
use std::path::{Path, PathBuf};

use crate::demod::{ChannelDemodulator, DemodChannel, DEFAULT_CHANNELS};
use crate::error::Result;
use crate::filter::FilterBank;
use crate::input::wav::WavSource;
use crate::input::{Waveform, WaveformSource};
use crate::normalize::normalize;
use crate::output::{output_filename, quantize, WavSink, WaveformSink, BITS_PER_SAMPLE};
use crate::report::Reporter;
use crate::spectrum::spectrum;

const COMPOSITE_NAME: &str = "Original FDM Signal";

/// Normalized composite plus one recovered voice per channel
#[derive(Debug, Clone)]
pub struct Demultiplexed {
    pub composite: Waveform,
    pub voices: [Waveform; 2],
}

/// Splits an FDM composite into its two voice channels
#[derive(Debug, Clone)]
pub struct Demultiplexer {
    channels: [DemodChannel; 2],
}

impl Default for Demultiplexer {
    fn default() -> Self {
        Self {
            channels: DEFAULT_CHANNELS,
        }
    }
}

impl Demultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channels(&self) -> &[DemodChannel; 2] {
        &self.channels
    }

    /// Normalize the whole composite once, then demodulate each channel from it.
    ///
    /// Every intermediate signal is handed to `reporter`; nothing it does can
    /// change the result.
    pub fn run(&self, input: &Waveform, reporter: &mut dyn Reporter) -> Result<Demultiplexed> {
        let composite = normalize(input)?;
        log::debug!(
            "normalized {} samples (input peak {:.6})",
            composite.len(),
            input.peak()
        );
        reporter.time_series(COMPOSITE_NAME, &composite);
        reporter.spectrum(&format!("{} Spectrum", COMPOSITE_NAME), spectrum(&composite));

        // One bank per run: the shared lowpass is designed once
        let mut bank = FilterBank::new();
        let mut demod = ChannelDemodulator::new(&mut bank);
        let voice1 = demod.demodulate(&composite, &self.channels[0])?;
        let voice2 = demod.demodulate(&composite, &self.channels[1])?;

        for (channel, voice) in self.channels.iter().zip([&voice1, &voice2]) {
            reporter.time_series(&format!("Demultiplexed {}", channel.name), voice);
            reporter.spectrum(
                &format!("{} Spectrum (after demodulation)", channel.name),
                spectrum(voice),
            );
        }

        Ok(Demultiplexed {
            composite,
            voices: [voice1, voice2],
        })
    }
}

/// What a completed run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub sample_rate: u32,
    pub samples: usize,
    pub duration_secs: f64,
    pub outputs: Vec<PathBuf>,
}

/// Load from `source`, demultiplex, and write one int16 file per voice into
/// `output_dir` through `sink`
pub fn process<S, K>(
    source: &mut S,
    sink: &mut K,
    output_dir: &Path,
    timestamp: bool,
    reporter: &mut dyn Reporter,
) -> Result<RunSummary>
where
    S: WaveformSource + ?Sized,
    K: WaveformSink + ?Sized,
{
    let raw = source.read()?;
    if raw.channels > 1 {
        log::info!("{} channels in input, using channel 0", raw.channels);
    }
    let input = raw.into_waveform()?;
    log::info!(
        "Loaded {} samples at {} Hz ({:.2}s)",
        input.len(),
        input.sample_rate(),
        input.duration_secs()
    );

    let demuxer = Demultiplexer::new();
    let result = demuxer.run(&input, reporter)?;

    let base_time = timestamp.then(Local::now);
    let mut outputs = Vec::with_capacity(result.voices.len());
    for (channel, voice) in demuxer.channels().iter().zip(result.voices.iter()) {
        let path = output_dir.join(output_filename(channel.stem, base_time));
        let pcm = quantize(voice);
        sink.write(&path, voice.sample_rate(), &pcm)?;
        log::info!(
            "Wrote {} ({} samples, {}-bit PCM)",
            path.display(),
            pcm.len(),
            BITS_PER_SAMPLE
        );
        outputs.push(path);
    }

    Ok(RunSummary {
        sample_rate: input.sample_rate(),
        samples: input.len(),
        duration_secs: input.duration_secs(),
        outputs,
    })
}

/// Demultiplex a WAV file into `voice1.wav` / `voice2.wav` under `output_dir`
pub fn process_file(
    input_path: &Path,
    output_dir: &Path,
    timestamp: bool,
    reporter: &mut dyn Reporter,
) -> Result<RunSummary> {
    let mut source = WavSource::new(input_path);
    process(&mut source, &mut WavSink, output_dir, timestamp, reporter)
}
