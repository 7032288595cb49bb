use crate::error::{DemuxError, Result};
use crate::input::Waveform;

/// Divide every sample by `max(|sample|)` so the peak sits at 1.0.
///
/// An empty buffer comes back empty. A non-empty silent buffer has no peak to
/// scale by and fails with `DegenerateSignal`.
pub fn normalize(waveform: &Waveform) -> Result<Waveform> {
    if waveform.is_empty() {
        return Ok(waveform.clone());
    }

    let peak = waveform.peak();
    if peak == 0.0 {
        return Err(DemuxError::DegenerateSignal {
            len: waveform.len(),
        });
    }

    // 1/peak overflows to inf for a subnormal peak, so divide directly
    let samples = waveform.samples().iter().map(|s| s / peak).collect();
    Ok(waveform.with_samples(samples))
}
