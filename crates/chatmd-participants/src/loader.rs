//! Participant definition loading with an explicit mtime-validated cache.
//!
//! A participant named `n` is defined by `<dir>/n.md`, itself a markdown
//! chat document: the front matter supplies `role`, `model`, `description`,
//! and `tools`; the body must parse to at most one message, whose content
//! becomes the system prompt.
//!
//! The cache is an object owned by the caller and passed into the loader,
//! not ambient global state. Entries are keyed by (name, directory) and
//! carry the definition file's modification time; a changed or deleted
//! file invalidates its entry on the next load.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chatmd_core::{ParticipantConfig, ParticipantRole, ParticipantSpec};
use chatmd_parser::{DocumentParser, build_body_messages, split_front_matter};
use serde_yaml::Value;
use tracing::debug;

use crate::errors::{ParticipantError, Result};

/// Loads participant configuration by name.
///
/// Implementations must be idempotent: loading the same name twice within
/// one parse is safe and returns the same configuration.
pub trait ParticipantLoader {
    /// Load the configuration for `name`, or `None` when the participant
    /// has no definition.
    fn load(&mut self, name: &str) -> Result<Option<ParticipantConfig>>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Cache
// ─────────────────────────────────────────────────────────────────────────────

/// Cached participant configurations with mtime-based freshness.
#[derive(Debug, Default)]
pub struct ParticipantCache {
    entries: HashMap<(String, PathBuf), CacheEntry>,
}

#[derive(Debug)]
struct CacheEntry {
    /// `None` records a confirmed absence of a definition file.
    config: Option<ParticipantConfig>,
    /// Modification time at load; `None` when no file existed.
    mtime: Option<SystemTime>,
}

impl ParticipantCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cached entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop the cached entry for one participant in one directory.
    pub fn invalidate(&mut self, name: &str, dir: &Path) {
        let _ = self.entries.remove(&(name.to_owned(), dir.to_path_buf()));
    }

    /// Fetch a cached configuration when its mtime still matches the file.
    fn fresh(&self, name: &str, dir: &Path) -> Option<Option<ParticipantConfig>> {
        let entry = self.entries.get(&(name.to_owned(), dir.to_path_buf()))?;
        let current = definition_mtime(&definition_path(dir, name));
        (current == entry.mtime).then(|| entry.config.clone())
    }

    fn store(
        &mut self,
        name: &str,
        dir: &Path,
        config: Option<ParticipantConfig>,
        mtime: Option<SystemTime>,
    ) {
        let _ = self
            .entries
            .insert((name.to_owned(), dir.to_path_buf()), CacheEntry { config, mtime });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Filesystem loader
// ─────────────────────────────────────────────────────────────────────────────

/// Loads participant definitions from `<dir>/<name>.md` files.
pub struct FsParticipantLoader<'cache> {
    dir: PathBuf,
    parser: DocumentParser,
    cache: &'cache mut ParticipantCache,
}

impl<'cache> FsParticipantLoader<'cache> {
    /// Create a loader over `dir`, reusing the caller-owned cache.
    pub fn new(dir: impl Into<PathBuf>, cache: &'cache mut ParticipantCache) -> Self {
        Self {
            dir: dir.into(),
            parser: DocumentParser::new(),
            cache,
        }
    }

    fn load_fresh(&self, name: &str) -> Result<(Option<ParticipantConfig>, Option<SystemTime>)> {
        let path = definition_path(&self.dir, name);
        if !path.is_file() {
            return Ok((None, None));
        }
        let mtime = definition_mtime(&path);
        let text = std::fs::read_to_string(&path).map_err(|source| ParticipantError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = parse_definition(&self.parser, name, &text)?;
        Ok((Some(config), mtime))
    }
}

impl ParticipantLoader for FsParticipantLoader<'_> {
    fn load(&mut self, name: &str) -> Result<Option<ParticipantConfig>> {
        if let Some(cached) = self.cache.fresh(name, &self.dir) {
            debug!(name, "participant cache hit");
            return Ok(cached);
        }
        debug!(name, "participant cache miss, reading definition");
        let (config, mtime) = self.load_fresh(name)?;
        self.cache.store(name, &self.dir, config.clone(), mtime);
        Ok(config)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Definition parsing
// ─────────────────────────────────────────────────────────────────────────────

/// Parse a definition document into a participant configuration.
///
/// # Errors
///
/// Fails when the front matter does not match the participant schema or
/// the body parses to more than one message.
pub fn parse_definition(
    parser: &DocumentParser,
    name: &str,
    text: &str,
) -> Result<ParticipantConfig> {
    let (front_matter, body) = split_front_matter(text)
        .map_err(|source| ParticipantError::Parse { name: name.to_owned(), source })?;
    let spec: ParticipantSpec =
        serde_yaml::from_value(Value::Mapping(front_matter.mapping().clone()))
            .map_err(|source| ParticipantError::Declaration { source })?;

    let nodes = parse_body(parser, name, body)?;
    let messages = build_body_messages(nodes);
    if messages.len() > 1 {
        return Err(ParticipantError::MultiMessageDefinition {
            name: name.to_owned(),
            count: messages.len(),
        });
    }
    let body_prompt = messages
        .first()
        .map(|m| m.content.to_text())
        .filter(|text| !text.trim().is_empty());

    let mut config =
        ParticipantConfig::with_role(name, spec.role.unwrap_or_else(|| default_role(name)));
    config.system_prompt = spec.system.clone().or(body_prompt);
    config.description.clone_from(&spec.description);
    config.model.clone_from(&spec.model);
    config.tools = spec.tools.unwrap_or_default();
    Ok(config)
}

fn parse_body(
    parser: &DocumentParser,
    name: &str,
    body: &str,
) -> Result<Vec<chatmd_core::MessageNode>> {
    parser
        .parse_nodes(body)
        .map_err(|source| ParticipantError::Parse { name: name.to_owned(), source })
}

/// Default role for a participant that declares none: the literal `user`
/// stays a user, everything else defined by file is an assistant.
#[must_use]
pub fn default_role(name: &str) -> ParticipantRole {
    if name == "user" {
        ParticipantRole::User
    } else {
        ParticipantRole::Assistant
    }
}

fn definition_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.md"))
}

fn definition_mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).ok().and_then(|m| m.modified().ok())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
