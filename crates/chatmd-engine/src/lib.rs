//! # chatmd-engine
//!
//! The full chatmd pipeline, one call deep:
//!
//! 1. split front matter and parse the body into messages
//! 2. expand transclusion links against the document's base directory
//! 3. resolve the participant registry (history discovery + front matter,
//!    definition files loaded through the caller-owned cache)
//! 4. compute recipients for every prefix and reassign roles from the
//!    final resolution
//!
//! The produced [`Conversation`] carries the ordered messages, the front
//! matter, and the participant registry. Callers own the
//! [`ParticipantCache`] so definition files survive across parses and
//! invalidate by modification time.

#![deny(unsafe_code)]

pub mod errors;

pub use errors::{ChatError, Result};

use std::path::PathBuf;

use chatmd_core::Conversation;
use chatmd_parser::{DocumentParser, ParsedDocument};
use chatmd_participants::{
    FsParticipantLoader, ParticipantCache, ParticipantLoader, resolve_registry,
};
use chatmd_resolve::RecipientResolver;
use chatmd_transclude::Transcluder;
use tracing::debug;

/// Engine configuration: where relative paths resolve.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Base directory for transclusion targets.
    pub base_dir: PathBuf,
    /// Directory holding participant definition files.
    pub participants_dir: PathBuf,
}

impl EngineConfig {
    /// Configuration rooted at a document's directory, with participant
    /// definitions in its `participants/` subdirectory.
    #[must_use]
    pub fn rooted_at(dir: impl Into<PathBuf>) -> Self {
        let base_dir = dir.into();
        let participants_dir = base_dir.join("participants");
        Self {
            base_dir,
            participants_dir,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::rooted_at(".")
    }
}

/// Parses markdown chat documents into resolved conversations.
pub struct ChatEngine {
    config: EngineConfig,
    parser: DocumentParser,
    transcluder: Transcluder,
}

impl ChatEngine {
    /// Create an engine with the given configuration.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let transcluder = Transcluder::new(&config.base_dir);
        Self {
            config,
            parser: DocumentParser::new(),
            transcluder,
        }
    }

    /// Parse a document, loading participant definitions from the
    /// configured directory through the caller-owned cache.
    ///
    /// # Errors
    ///
    /// Returns the first [`ChatError`] any pipeline stage produced.
    pub fn parse(&self, input: &str, cache: &mut ParticipantCache) -> Result<Conversation> {
        let mut loader = FsParticipantLoader::new(&self.config.participants_dir, cache);
        self.parse_with_loader(input, &mut loader)
    }

    /// Parse a document with a custom participant loader.
    ///
    /// # Errors
    ///
    /// Returns the first [`ChatError`] any pipeline stage produced.
    pub fn parse_with_loader(
        &self,
        input: &str,
        loader: &mut dyn ParticipantLoader,
    ) -> Result<Conversation> {
        let ParsedDocument {
            front_matter,
            mut messages,
        } = self.parser.parse(input)?;
        debug!(messages = messages.len(), "document parsed");

        self.transcluder.post_process(&mut messages)?;
        let participants = resolve_registry(&messages, &front_matter, loader)?;
        RecipientResolver::new(&participants).resolve_all(&mut messages)?;
        debug!(
            participants = participants.len(),
            recipient = ?messages.last().and_then(|m| m.recipient.as_deref()),
            "conversation resolved"
        );

        Ok(Conversation {
            messages,
            front_matter,
            participants,
        })
    }
}
