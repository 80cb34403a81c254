//! Resolution error types.

use thiserror::Error;

/// Errors produced by recipient resolution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The resume-after-execution bounce found no prior non-execution
    /// message to return to. A defensive invariant violation: well-formed
    /// transcripts always have the requesting message.
    #[error("no requesting message found before the execution record preceding message {index}")]
    MissingRequestingMessage {
        /// Index of the message whose recipient was being computed.
        index: usize,
    },
}

/// Result type for resolution operations.
pub type Result<T> = std::result::Result<T, ResolveError>;
