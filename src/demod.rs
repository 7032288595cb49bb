use std::f64::consts::PI;

use crate::error::Result;
use crate::filter::{apply, FilterBank, FilterSpec};
use crate::input::Waveform;

/// Butterworth order used for every stage
pub const FILTER_ORDER: usize = 4;

/// Baseband voice bandwidth shared by both channels
pub const LOWPASS_CUTOFF_HZ: f64 = 4000.0;

/// One voice channel: its carrier, the band isolated around it, and the
/// baseband cutoff applied after mixing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemodChannel {
    pub name: &'static str,
    /// Output file stem
    pub stem: &'static str,
    pub carrier_hz: f64,
    pub band_hz: (f64, f64),
    pub lowpass_cutoff_hz: f64,
}

impl DemodChannel {
    pub fn bandpass_spec(&self, sample_rate: u32) -> FilterSpec {
        FilterSpec::bandpass(FILTER_ORDER, self.band_hz.0, self.band_hz.1, sample_rate)
    }

    pub fn lowpass_spec(&self, sample_rate: u32) -> FilterSpec {
        FilterSpec::lowpass(FILTER_ORDER, self.lowpass_cutoff_hz, sample_rate)
    }
}

pub const VOICE1: DemodChannel = DemodChannel {
    name: "Voice 1 (8kHz carrier)",
    stem: "voice1",
    carrier_hz: 8000.0,
    band_hz: (6000.0, 10000.0),
    lowpass_cutoff_hz: LOWPASS_CUTOFF_HZ,
};

pub const VOICE2: DemodChannel = DemodChannel {
    name: "Voice 2 (16kHz carrier)",
    stem: "voice2",
    carrier_hz: 16000.0,
    band_hz: (14000.0, 18000.0),
    lowpass_cutoff_hz: LOWPASS_CUTOFF_HZ,
};

pub const DEFAULT_CHANNELS: [DemodChannel; 2] = [VOICE1, VOICE2];

/// Multiply by `cos(2*pi*carrier*t)`, `t = n / sample_rate`
pub fn mix(waveform: &Waveform, carrier_hz: f64) -> Waveform {
    let omega = 2.0 * PI * carrier_hz;
    let mixed = waveform
        .samples()
        .iter()
        .zip(waveform.time_axis())
        .map(|(&s, t)| s * (omega * t).cos())
        .collect();
    waveform.with_samples(mixed)
}

/// Recovers one channel's baseband voice from the composite signal
pub struct ChannelDemodulator<'a> {
    bank: &'a mut FilterBank,
}

impl<'a> ChannelDemodulator<'a> {
    /// Demodulate with coefficients drawn from (and cached in) `bank`
    pub fn new(bank: &'a mut FilterBank) -> Self {
        Self { bank }
    }

    /// Bandpass-isolate, mix down with the carrier, lowpass to baseband.
    /// Output keeps the input's length and rate.
    pub fn demodulate(&mut self, waveform: &Waveform, channel: &DemodChannel) -> Result<Waveform> {
        let rate = waveform.sample_rate();
        let bandpass = self.bank.coefficients(&channel.bandpass_spec(rate))?;
        let lowpass = self.bank.coefficients(&channel.lowpass_spec(rate))?;

        let isolated = apply(&bandpass, waveform);
        let mixed = mix(&isolated, channel.carrier_hz);
        let voice = apply(&lowpass, &mixed);

        log::debug!(
            "{}: isolated peak {:.4}, mixed peak {:.4}, voice peak {:.4}",
            channel.name,
            isolated.peak(),
            mixed.peak(),
            voice.peak()
        );
        Ok(voice)
    }
}

/// Demodulate a single channel with freshly designed filters.
///
/// Gives the same samples as `ChannelDemodulator`; use that instead when
/// several channels share a lowpass design.
pub fn demodulate(waveform: &Waveform, channel: &DemodChannel) -> Result<Waveform> {
    let mut bank = FilterBank::new();
    ChannelDemodulator::new(&mut bank).demodulate(waveform, channel)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::DemuxError;
    use crate::normalize::normalize;
    use crate::spectrum::{dominant_frequency, spectrum};

    /// 440 Hz on the 8 kHz carrier plus 550 Hz on the 16 kHz carrier
    pub(crate) fn composite(rate: u32, len: usize) -> Waveform {
        let rate_f = rate as f64;
        let samples = (0..len)
            .map(|n| {
                let t = n as f64 / rate_f;
                let v1 = (2.0 * PI * 440.0 * t).cos() * (2.0 * PI * 8000.0 * t).cos();
                let v2 = (2.0 * PI * 550.0 * t).cos() * (2.0 * PI * 16000.0 * t).cos();
                v1 + v2
            })
            .collect();
        Waveform::new(rate, samples).unwrap()
    }

    fn magnitude_at(waveform: &Waveform, freq: f64) -> f64 {
        let bins: Vec<_> = spectrum(waveform).collect();
        let width = bins[1].frequency;
        bins[(freq / width).round() as usize].magnitude
    }

    #[test]
    fn test_mix_is_cosine_at_carrier() {
        let ones = Waveform::new(4, vec![1.0; 4]).unwrap();
        let mixed = mix(&ones, 1.0);
        let expected = [1.0, 0.0, -1.0, 0.0];
        for (got, want) in mixed.samples().iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn test_recovers_each_tone() {
        let input = normalize(&composite(40000, 40000)).unwrap();
        let mut bank = FilterBank::new();
        let mut demod = ChannelDemodulator::new(&mut bank);

        let voice1 = demod.demodulate(&input, &VOICE1).unwrap();
        let voice2 = demod.demodulate(&input, &VOICE2).unwrap();
        assert_eq!(voice1.len(), input.len());
        assert_eq!(voice2.sample_rate(), 40000);

        let peak1 = dominant_frequency(spectrum(&voice1)).unwrap();
        let peak2 = dominant_frequency(spectrum(&voice2)).unwrap();
        assert!((peak1.frequency - 440.0).abs() < 1.5, "voice 1 peak at {}", peak1.frequency);
        assert!((peak2.frequency - 550.0).abs() < 1.5, "voice 2 peak at {}", peak2.frequency);

        // Other channel's tone at least 20 dB down
        assert!(magnitude_at(&voice1, 550.0) < peak1.magnitude * 0.1);
        assert!(magnitude_at(&voice2, 440.0) < peak2.magnitude * 0.1);
    }

    #[test]
    fn test_lowpass_designed_once_for_both_channels() {
        let input = composite(40000, 400);
        let mut bank = FilterBank::new();
        let mut demod = ChannelDemodulator::new(&mut bank);
        for channel in DEFAULT_CHANNELS.iter() {
            demod.demodulate(&input, channel).unwrap();
        }
        // two bandpass designs, one shared lowpass
        assert_eq!(bank.len(), 3);
    }

    #[test]
    fn test_matches_one_off_demodulation() {
        let input = composite(40000, 2000);
        let mut bank = FilterBank::new();
        let cached = ChannelDemodulator::new(&mut bank)
            .demodulate(&input, &VOICE2)
            .unwrap();
        assert_eq!(cached, demodulate(&input, &VOICE2).unwrap());
    }

    #[test]
    fn test_boundary_lengths() {
        let empty = Waveform::new(40000, vec![]).unwrap();
        assert!(demodulate(&empty, &VOICE1).unwrap().is_empty());

        let single = Waveform::new(40000, vec![1.0]).unwrap();
        let out = demodulate(&single, &VOICE1).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out.samples()[0].is_finite());
    }

    #[test]
    fn test_band_above_nyquist_propagates() {
        // 16 kHz channel cannot exist at 32 kHz sampling
        let input = composite(32000, 100);
        assert!(matches!(
            demodulate(&input, &VOICE2),
            Err(DemuxError::InvalidSpec { .. })
        ));
    }
}
