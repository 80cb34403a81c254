//! Front matter — the leading `---`-delimited YAML block.
//!
//! Stored as an ordered mapping (YAML mappings preserve document order)
//! with typed accessors for the keys the engine consumes: `system`,
//! `participants`, and `template_params`. Unknown keys are preserved for
//! callers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use crate::participants::ParticipantSpec;

/// Parsed front matter of a markdown chat document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrontMatter {
    mapping: Mapping,
}

impl FrontMatter {
    /// Wrap a parsed YAML mapping.
    #[must_use]
    pub fn new(mapping: Mapping) -> Self {
        Self { mapping }
    }

    /// Empty front matter (document had no leading block).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns `true` if no keys are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Raw value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.mapping.get(key)
    }

    /// The underlying ordered mapping.
    #[must_use]
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// The `system` text, if declared.
    #[must_use]
    pub fn system(&self) -> Option<&str> {
        self.get("system").and_then(Value::as_str)
    }

    /// The `template_params` mapping, if declared.
    #[must_use]
    pub fn template_params(&self) -> Option<&Mapping> {
        self.get("template_params").and_then(Value::as_mapping)
    }

    /// Declared participants, in declaration order.
    ///
    /// # Errors
    ///
    /// Returns the YAML error when a declaration does not match the
    /// participant schema.
    pub fn participants(&self) -> Result<Vec<(String, ParticipantSpec)>, serde_yaml::Error> {
        let Some(mapping) = self.get("participants").and_then(Value::as_mapping) else {
            return Ok(Vec::new());
        };
        let mut declared = Vec::with_capacity(mapping.len());
        for (key, value) in mapping {
            let Some(name) = key.as_str() else { continue };
            let spec = if value.is_null() {
                ParticipantSpec::default()
            } else {
                serde_yaml::from_value(value.clone())?
            };
            declared.push((name.to_owned(), spec));
        }
        Ok(declared)
    }

    /// Declared participants as a name-keyed map.
    ///
    /// # Errors
    ///
    /// Returns the YAML error when a declaration does not match the
    /// participant schema.
    pub fn participant_map(&self) -> Result<BTreeMap<String, ParticipantSpec>, serde_yaml::Error> {
        Ok(self.participants()?.into_iter().collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
