//! Crate-wide error types

use thiserror::Error;

/// Errors raised while resolving and serving coverage requests.
#[derive(Debug, Error)]
pub enum CoverageError {
    #[error("unknown gene: {0}")]
    UnknownGene(String),

    #[error("unknown transcript: {0}")]
    UnknownTranscript(String),

    #[error("unknown sample: {0}")]
    UnknownSample(String),

    #[error("unsupported sample {id}: {reason}")]
    UnsupportedSample { id: String, reason: String },

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("annotation error: {0}")]
    Annotation(#[from] crate::io::refgene::RefGeneError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CoverageError>;
