//! Participant resolution error types.

use chatmd_parser::ParseError;
use thiserror::Error;

/// Errors produced while resolving participant configuration.
#[derive(Debug, Error)]
pub enum ParticipantError {
    /// A definition file's body parsed to more than one message.
    #[error("participant definition for {name} contains {count} messages, expected at most one")]
    MultiMessageDefinition {
        /// Participant name.
        name: String,
        /// How many messages the body produced.
        count: usize,
    },
    /// A definition file failed to parse.
    #[error("failed to parse participant definition for {name}: {source}")]
    Parse {
        /// Participant name.
        name: String,
        /// Underlying parse error.
        #[source]
        source: ParseError,
    },
    /// A front-matter participant declaration was malformed.
    #[error("invalid participant declaration: {source}")]
    Declaration {
        /// Underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },
    /// A definition file could not be read.
    #[error("failed to read participant definition {path}: {source}")]
    Io {
        /// The offending path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for participant operations.
pub type Result<T> = std::result::Result<T, ParticipantError>;
