//! Crate-wide error type.

use std::io;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal failures of a coordinated annealing run.
///
/// Nothing here is retried: every variant aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("no workers to coordinate")]
    NoWorkers,

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("collective operation failed: {0}")]
    Substrate(String),

    #[error("no convergence after {rounds} rounds")]
    RoundLimit { rounds: usize },

    #[error("temperature stopped decreasing at round {round}")]
    TemperatureUnderflow { round: usize },

    #[error("pending work stuck at {pending} for {rounds} rounds")]
    Stalled { rounds: usize, pending: u64 },

    #[error("malformed instance at line {line}: {message}")]
    Instance { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }
}
