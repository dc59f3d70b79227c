//! Error types of this crate.

use thiserror::Error;

/// Catch-all error for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Base parameters outside their supported domain.
    #[error("invalid base: height {height}, width {width}, maximum {maximum}")]
    InvalidBase {
        /// Requested number of rows.
        height: u8,
        /// Requested number of columns.
        width: u8,
        /// Requested maximum cell value.
        maximum: u8,
    },
    /// A code does not decode to a well-formed grid.
    #[error("malformed code: {0}")]
    MalformedCode(String),
    /// An internal consistency check failed; this is a bug.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
    /// A container file does not follow the stream format.
    #[error("corrupted container: {0}")]
    ContainerCorruption(String),
    /// A checkpoint cannot be replayed against the current enumeration.
    #[error("checkpoint does not match the enumeration: {0}")]
    ResumeMismatch(String),
    /// Error forwarded from the operating system.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Short-hand for results of this crate.
pub type Result<T> = std::result::Result<T, Error>;
