//! Error hierarchy for parsing, pairing, and HDT invariant failures.

use thiserror::Error;

/// Failures arising from parsing input trees or pairing their leaf sets.
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("failed to parse Newick tree in {file}: {message}")]
    Parse { file: String, message: String },

    #[error("leaf sets of the two trees do not match")]
    LeafSetMismatch,

    #[error("error reading {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failures internal to HDT construction and counter maintenance.
///
/// These are only ever raised from debug-only invariant checks (see
/// [`crate::hdt::counters`]); a release build never constructs these
/// variants on the hot path.
#[derive(Debug, Error)]
pub enum HdtError {
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error("HDT node pool allocation failed")]
    AllocationFailed,
}

/// Top-level error type returned by the public driver API.
#[derive(Debug, Error)]
pub enum DistanceError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Hdt(#[from] HdtError),
}

pub type DistResult<T> = Result<T, DistanceError>;
