//! Participant registry resolution.
//!
//! Merges, lowest to highest precedence:
//!
//! 1. participants implicitly discovered from user-role messages in the
//!    history, resolved through the loader
//! 2. front-matter declarations, overlaid on whatever discovery produced
//!
//! If the merged registry contains only `user`, an implicit `assistant`
//! counterpart is synthesized. Each distinct name goes through the loader
//! exactly once per resolution.

use std::collections::BTreeMap;

use chatmd_core::constants::{CELL_OUTPUT_NAME, IMPLICIT_ASSISTANT_NAME, IMPLICIT_USER_NAME};
use chatmd_core::messages::{ResolvedMessage, Role};
use chatmd_core::{FrontMatter, ParticipantConfig};
use tracing::debug;

use crate::errors::{ParticipantError, Result};
use crate::loader::{ParticipantLoader, default_role};

/// Resolve the participant registry for a message history.
///
/// # Errors
///
/// Fails when a front-matter declaration is malformed or the loader fails
/// for any discovered or declared name.
pub fn resolve_registry(
    messages: &[ResolvedMessage],
    front_matter: &FrontMatter,
    loader: &mut dyn ParticipantLoader,
) -> Result<BTreeMap<String, ParticipantConfig>> {
    let mut registry: BTreeMap<String, ParticipantConfig> = BTreeMap::new();
    let mut loaded: BTreeMap<String, Option<ParticipantConfig>> = BTreeMap::new();

    // 1. Implicit discovery from user-role messages.
    for message in messages {
        if message.role != Role::User || message.name == CELL_OUTPUT_NAME {
            continue;
        }
        if registry.contains_key(&message.name) {
            continue;
        }
        let config = load_once(loader, &mut loaded, &message.name)?
            .unwrap_or_else(|| ParticipantConfig::user(&message.name));
        let _ = registry.insert(message.name.clone(), config);
    }

    // 2. Front-matter declarations overlay discovery.
    let declared = front_matter
        .participants()
        .map_err(|source| ParticipantError::Declaration { source })?;
    for (name, spec) in declared {
        let mut config = match registry.remove(&name) {
            Some(existing) => existing,
            None => load_once(loader, &mut loaded, &name)?
                .unwrap_or_else(|| ParticipantConfig::with_role(&name, default_role(&name))),
        };
        config.apply_spec(&spec);
        let _ = registry.insert(name, config);
    }

    // A lone user converses with an implicit assistant.
    if registry.len() == 1 && registry.contains_key(IMPLICIT_USER_NAME) {
        debug!("synthesizing implicit assistant participant");
        let _ = registry.insert(
            IMPLICIT_ASSISTANT_NAME.to_owned(),
            ParticipantConfig::assistant(IMPLICIT_ASSISTANT_NAME),
        );
    }

    Ok(registry)
}

/// Call the loader at most once per distinct name.
fn load_once(
    loader: &mut dyn ParticipantLoader,
    loaded: &mut BTreeMap<String, Option<ParticipantConfig>>,
    name: &str,
) -> Result<Option<ParticipantConfig>> {
    if let Some(cached) = loaded.get(name) {
        return Ok(cached.clone());
    }
    let config = loader.load(name)?;
    let _ = loaded.insert(name.to_owned(), config.clone());
    Ok(config)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
