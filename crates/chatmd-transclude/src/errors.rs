//! Transclusion error types.

use thiserror::Error;

/// Errors produced while expanding transclusion links.
#[derive(Debug, Error)]
pub enum TranscludeError {
    /// No file matched the link.
    #[error("transclusion not found: {link}")]
    NotFound {
        /// The link target as written.
        link: String,
    },
    /// A matched file's extension is outside the supported set.
    #[error("unsupported transclusion type: {path}")]
    UnsupportedType {
        /// The offending path.
        path: String,
    },
    /// A glob pattern failed to compile.
    #[error("invalid transclusion pattern {pattern}: {source}")]
    Pattern {
        /// The pattern as written.
        pattern: String,
        /// Underlying glob error.
        #[source]
        source: globset::Error,
    },
    /// A matched file could not be read.
    #[error("failed to read transclusion {path}: {source}")]
    Io {
        /// The offending path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for transclusion operations.
pub type Result<T> = std::result::Result<T, TranscludeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = TranscludeError::NotFound {
            link: "missing.md".into(),
        };
        assert_eq!(err.to_string(), "transclusion not found: missing.md");
    }

    #[test]
    fn unsupported_type_display() {
        let err = TranscludeError::UnsupportedType {
            path: "archive.tar".into(),
        };
        assert_eq!(err.to_string(), "unsupported transclusion type: archive.tar");
    }
}
