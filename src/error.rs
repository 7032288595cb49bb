use std::path::PathBuf;
use thiserror::Error;

use crate::filter::FilterKind;

pub type Result<T> = std::result::Result<T, DemuxError>;

/// Everything that can abort a demultiplexing run
#[derive(Debug, Error)]
pub enum DemuxError {
    /// Filter parameters that cannot produce a valid design
    #[error("invalid {kind} filter spec: {message}")]
    InvalidSpec { kind: FilterKind, message: String },

    /// Normalization of a buffer whose peak amplitude is zero
    #[error("cannot normalize a silent signal ({len} samples, peak amplitude 0)")]
    DegenerateSignal { len: usize },

    /// Zero sample rate or a non-finite sample
    #[error("invalid waveform: {0}")]
    InvalidWaveform(String),

    /// The waveform source could not be opened or decoded
    #[error("failed to read {}: {source}", path.display())]
    SourceReadFailure {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    /// The waveform sink could not create or finalize its output
    #[error("failed to write {}: {source}", path.display())]
    SinkWriteFailure {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
}

impl DemuxError {
    pub(crate) fn invalid_spec(kind: FilterKind, message: impl Into<String>) -> Self {
        DemuxError::InvalidSpec {
            kind,
            message: message.into(),
        }
    }
}
