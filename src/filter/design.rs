//! Butterworth IIR design in second-order-section form
//!
//! Analog prototype poles are frequency-transformed to the requested band,
//! mapped to the z-plane with the bilinear transform (cutoffs prewarped), and
//! grouped into conjugate-pole biquads. Frequencies are handled normalized to
//! Nyquist, so the bilinear transform runs at an implied rate of 2.

use rustfft::num_complex::Complex64;
use std::f64::consts::PI;

use super::{Biquad, FilterBand, FilterCoefficients, FilterKind, FilterSpec};
use crate::error::{DemuxError, Result};

/// Bilinear constant `2 * fs` for the implied rate of 2
const BILINEAR_K: f64 = 4.0;

/// Imaginary parts below this are treated as real poles when pairing
const REAL_POLE_TOL: f64 = 1e-10;

/// Zeros, poles and gain of a transfer function
struct Zpk {
    zeros: Vec<Complex64>,
    poles: Vec<Complex64>,
    gain: f64,
}

/// Design a Butterworth filter for `spec`.
///
/// Fails with `InvalidSpec` for a zero order, non-positive or non-finite
/// cutoffs, an unordered band, or any edge at or above Nyquist.
pub fn design(spec: &FilterSpec) -> Result<FilterCoefficients> {
    validate(spec)?;

    let nyquist = spec.nyquist();
    let prototype = butterworth_prototype(spec.order);

    let analog = match spec.band {
        FilterBand::Lowpass { cutoff_hz } => {
            lowpass_transform(prototype, prewarp(cutoff_hz / nyquist))
        }
        FilterBand::Bandpass { low_hz, high_hz } => bandpass_transform(
            prototype,
            prewarp(low_hz / nyquist),
            prewarp(high_hz / nyquist),
        ),
    };

    let digital = bilinear(analog);
    let coefficients = FilterCoefficients::new(to_sections(digital, spec.kind()));
    debug_assert!(coefficients.is_stable(), "unstable design for {:?}", spec);
    Ok(coefficients)
}

fn validate(spec: &FilterSpec) -> Result<()> {
    let kind = spec.kind();
    if spec.order == 0 {
        return Err(DemuxError::invalid_spec(kind, "order must be at least 1"));
    }
    if spec.sample_rate == 0 {
        return Err(DemuxError::invalid_spec(kind, "sample rate must be positive"));
    }

    let nyquist = spec.nyquist();
    let check_edge = |name: &str, hz: f64| -> Result<()> {
        if !hz.is_finite() || hz <= 0.0 {
            return Err(DemuxError::invalid_spec(
                kind,
                format!("{} {} Hz must be positive", name, hz),
            ));
        }
        if hz >= nyquist {
            return Err(DemuxError::invalid_spec(
                kind,
                format!("{} {} Hz is not below Nyquist ({} Hz)", name, hz, nyquist),
            ));
        }
        Ok(())
    };

    match spec.band {
        FilterBand::Lowpass { cutoff_hz } => check_edge("cutoff", cutoff_hz),
        FilterBand::Bandpass { low_hz, high_hz } => {
            check_edge("low cutoff", low_hz)?;
            check_edge("high cutoff", high_hz)?;
            if low_hz >= high_hz {
                return Err(DemuxError::invalid_spec(
                    kind,
                    format!("low cutoff {} Hz must be below high cutoff {} Hz", low_hz, high_hz),
                ));
            }
            Ok(())
        }
    }
}

/// Prewarp a Nyquist-normalized frequency to the analog axis
fn prewarp(normalized: f64) -> f64 {
    BILINEAR_K * (PI * normalized / 2.0).tan()
}

/// Unit-cutoff analog Butterworth poles, evenly spaced on the left half circle
fn butterworth_prototype(order: usize) -> Zpk {
    let n = order as i64;
    let poles = (0..n)
        .map(|k| {
            let m = 2 * k - (n - 1);
            -Complex64::from_polar(1.0, PI * m as f64 / (2 * n) as f64)
        })
        .collect();

    Zpk {
        zeros: Vec::new(),
        poles,
        gain: 1.0,
    }
}

fn lowpass_transform(proto: Zpk, cutoff: f64) -> Zpk {
    let degree = (proto.poles.len() - proto.zeros.len()) as i32;
    Zpk {
        zeros: proto.zeros.iter().map(|&z| z * cutoff).collect(),
        poles: proto.poles.iter().map(|&p| p * cutoff).collect(),
        gain: proto.gain * cutoff.powi(degree),
    }
}

/// Each prototype pole splits into a pair around the band center; the excess
/// degree becomes zeros at the origin
fn bandpass_transform(proto: Zpk, low: f64, high: f64) -> Zpk {
    let bandwidth = high - low;
    let center_sq = low * high;
    let degree = proto.poles.len() - proto.zeros.len();

    let split = |roots: &[Complex64]| -> Vec<Complex64> {
        let scaled: Vec<Complex64> = roots.iter().map(|&r| r * (bandwidth / 2.0)).collect();
        let upper = scaled.iter().map(|&r| r + (r * r - center_sq).sqrt());
        let lower = scaled.iter().map(|&r| r - (r * r - center_sq).sqrt());
        upper.chain(lower).collect()
    };

    let mut zeros = split(&proto.zeros);
    zeros.extend(std::iter::repeat(Complex64::new(0.0, 0.0)).take(degree));

    Zpk {
        zeros,
        poles: split(&proto.poles),
        gain: proto.gain * bandwidth.powi(degree as i32),
    }
}

/// Map s-plane roots to the z-plane; zeros at infinity land on z = -1
fn bilinear(analog: Zpk) -> Zpk {
    let k = Complex64::new(BILINEAR_K, 0.0);
    let degree = analog.poles.len() - analog.zeros.len();

    let num: Complex64 = analog.zeros.iter().map(|&z| k - z).product();
    let den: Complex64 = analog.poles.iter().map(|&p| k - p).product();

    let mut zeros: Vec<Complex64> = analog.zeros.iter().map(|&z| (k + z) / (k - z)).collect();
    zeros.extend(std::iter::repeat(Complex64::new(-1.0, 0.0)).take(degree));

    Zpk {
        zeros,
        poles: analog.poles.iter().map(|&p| (k + p) / (k - p)).collect(),
        gain: analog.gain * (num / den).re,
    }
}

/// Group digital poles into biquads.
///
/// Butterworth zeros only ever sit at z = 1 or z = -1, so each section's
/// numerator is fixed by the filter kind: lowpass sections carry a double
/// zero at -1, bandpass sections one zero at each of +1 and -1. The overall
/// gain is folded into the first section.
fn to_sections(digital: Zpk, kind: FilterKind) -> Vec<Biquad> {
    let (mut complex, mut real): (Vec<Complex64>, Vec<Complex64>) = digital
        .poles
        .into_iter()
        .partition(|p| p.im.abs() > REAL_POLE_TOL);
    complex.retain(|p| p.im > 0.0);
    real.sort_by(|a, b| a.re.total_cmp(&b.re));

    let numerator = match kind {
        FilterKind::Lowpass => [1.0, 2.0, 1.0],
        FilterKind::Bandpass => [1.0, 0.0, -1.0],
    };

    let mut sections: Vec<Biquad> = complex
        .iter()
        .map(|p| Biquad::new(numerator, [-2.0 * p.re, p.norm_sqr()]))
        .collect();

    for pair in real.chunks(2) {
        match pair {
            [p1, p2] => sections.push(Biquad::new(
                numerator,
                [-(p1.re + p2.re), p1.re * p2.re],
            )),
            // Odd lowpass order leaves one real pole with one zero at -1
            [p] => sections.push(Biquad::new([1.0, 1.0, 0.0], [-p.re, 0.0])),
            _ => unreachable!("chunks(2) yields one or two poles"),
        }
    }

    if let Some(first) = sections.first_mut() {
        for b in first.b.iter_mut() {
            *b *= digital.gain;
        }
    }
    sections
}
