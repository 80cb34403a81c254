//! Parser error types.

use thiserror::Error;

/// Errors produced while parsing a markdown chat document.
///
/// None of these are recoverable: a parse either fully succeeds or fully
/// fails. Callers are expected to snapshot the raw input as a diagnostic
/// artifact before surfacing a grammar error.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The leading `---` block contained malformed YAML.
    #[error("malformed front matter: {source}")]
    FrontMatter {
        /// Underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },
    /// A header or block did not match any grammar alternative at a
    /// required position.
    #[error("grammar error at line {line}: {message}")]
    Grammar {
        /// 1-based line number within the document body.
        line: usize,
        /// What failed to match.
        message: String,
    },
}

impl ParseError {
    /// Create a grammar error at the given body line.
    #[must_use]
    pub fn grammar(line: usize, message: impl Into<String>) -> Self {
        Self::Grammar {
            line,
            message: message.into(),
        }
    }
}

/// Result type for parser operations.
pub type Result<T> = std::result::Result<T, ParseError>;
