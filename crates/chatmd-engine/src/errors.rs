//! Top-level error type for the chatmd engine.

use chatmd_parser::ParseError;
use chatmd_participants::ParticipantError;
use chatmd_resolve::ResolveError;
use chatmd_transclude::TranscludeError;
use thiserror::Error;

/// Any failure while turning a document into a [`chatmd_core::Conversation`].
///
/// None of these are retried internally, and there is no partial-document
/// recovery: a parse either fully succeeds or fully fails with the first
/// error the pipeline hit.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Front matter or grammar failure.
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// Transclusion failure.
    #[error("{0}")]
    Transclude(#[from] TranscludeError),

    /// Participant resolution failure.
    #[error("{0}")]
    Participant(#[from] ParticipantError),

    /// Recipient resolution failure.
    #[error("{0}")]
    Resolve(#[from] ResolveError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, ChatError>;
