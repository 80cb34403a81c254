//! Participant configuration types.
//!
//! A participant is a named conversation party. Its configuration merges,
//! lowest to highest precedence: loader defaults, the participant's
//! definition file, and the document's front-matter declaration.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::messages::Role;

/// Role a participant speaks with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    /// Human or human-proxy side of the conversation.
    #[default]
    User,
    /// Model side of the conversation.
    Assistant,
}

impl ParticipantRole {
    /// The message [`Role`] this participant role corresponds to.
    #[must_use]
    pub fn as_role(self) -> Role {
        match self {
            Self::User => Role::User,
            Self::Assistant => Role::Assistant,
        }
    }
}

/// Front-matter participant declaration.
///
/// All fields are optional; anything left unset falls back to the
/// participant's definition file and then to defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParticipantSpec {
    /// Participant role override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<ParticipantRole>,
    /// System prompt override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Model identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Tool names this participant may invoke.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<BTreeSet<String>>,
}

/// Resolved configuration of a single participant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticipantConfig {
    /// Participant name.
    pub name: String,
    /// Participant role.
    pub role: ParticipantRole,
    /// System prompt text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Model identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Tool names this participant may invoke.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tools: BTreeSet<String>,
}

impl ParticipantConfig {
    /// Create a user-role participant with no configuration.
    #[must_use]
    pub fn user(name: impl Into<String>) -> Self {
        Self::with_role(name, ParticipantRole::User)
    }

    /// Create an assistant-role participant with no configuration.
    #[must_use]
    pub fn assistant(name: impl Into<String>) -> Self {
        Self::with_role(name, ParticipantRole::Assistant)
    }

    /// Create a participant with the given role and no configuration.
    #[must_use]
    pub fn with_role(name: impl Into<String>, role: ParticipantRole) -> Self {
        Self {
            name: name.into(),
            role,
            system_prompt: None,
            description: None,
            model: None,
            tools: BTreeSet::new(),
        }
    }

    /// Overlay a front-matter declaration onto this configuration.
    ///
    /// Set fields win; unset fields preserve the current value.
    pub fn apply_spec(&mut self, spec: &ParticipantSpec) {
        if let Some(role) = spec.role {
            self.role = role;
        }
        if let Some(system) = &spec.system {
            self.system_prompt = Some(system.clone());
        }
        if let Some(description) = &spec.description {
            self.description = Some(description.clone());
        }
        if let Some(model) = &spec.model {
            self.model = Some(model.clone());
        }
        if let Some(tools) = &spec.tools {
            self.tools = tools.clone();
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
