//! Demultiplex a two-channel FDM voice recording.
//!
//! The composite is normalized once, then each voice is recovered by
//! bandpass isolation around its carrier, coherent mixing with a cosine at the
//! carrier frequency, and a lowpass back to baseband. Filters are 4th-order
//! Butterworth designs evaluated as cascaded second-order sections.

pub mod demod;
pub mod error;
pub mod filter;
pub mod input;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod spectrum;

pub use demod::{demodulate, ChannelDemodulator, DemodChannel, DEFAULT_CHANNELS};
pub use error::{DemuxError, Result};
pub use filter::{apply, design, FilterBank, FilterCoefficients, FilterSpec};
pub use input::Waveform;
pub use normalize::normalize;
pub use pipeline::{process_file, Demultiplexer, RunSummary};
pub use spectrum::{spectrum, SpectrumSample};
