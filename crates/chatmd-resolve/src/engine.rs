//! The recipient resolution engine.
//!
//! Runs once per growing prefix of the message list and decides who the
//! last message addresses. Rules, in priority order (first match wins):
//!
//! 1. a resolving mention in the last participant message
//! 2. tool / cell-output records return to their caller
//! 3. resume-after-execution bounce through the record's recipient
//! 4. strict alternation between exactly two participants, one of them
//!    `user`
//! 5. an assistant replies to whoever spoke before it
//! 6. a user re-initiates with the most recent differently-named speaker
//! 7. nobody
//!
//! State folds forward across prefixes — participant message indices and
//! previously computed recipients — so a full pass is linear in message
//! count with small bounded backward scans for rules 3 and 6. Resolution
//! is prefix-stable: computing prefix `n` never alters recipients already
//! assigned for earlier prefixes.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chatmd_core::constants::CELL_OUTPUT_NAME;
use chatmd_core::messages::{ResolvedMessage, Role};
use chatmd_core::ParticipantConfig;
use tracing::debug;

use crate::errors::{ResolveError, Result};
use crate::mentions::MentionScanner;

/// Computes recipients across a message list.
pub struct RecipientResolver<'p> {
    participants: &'p BTreeMap<String, ParticipantConfig>,
    names: BTreeSet<String>,
    known_roles: HashMap<String, Role>,
    participant_indices: Vec<usize>,
    scanner: MentionScanner,
}

impl<'p> RecipientResolver<'p> {
    /// Create a resolver over the given participant registry.
    #[must_use]
    pub fn new(participants: &'p BTreeMap<String, ParticipantConfig>) -> Self {
        Self {
            participants,
            names: participants.keys().cloned().collect(),
            known_roles: HashMap::new(),
            participant_indices: Vec::new(),
            scanner: MentionScanner::new(),
        }
    }

    /// Resolve recipients for every prefix, then reassign roles based on
    /// the final recipient.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::MissingRequestingMessage`] when the bounce
    /// rule finds no prior non-execution message.
    pub fn resolve_all(&mut self, messages: &mut [ResolvedMessage]) -> Result<()> {
        for index in 0..messages.len() {
            self.resolve_prefix(messages, index)?;
        }
        reassign_roles(messages);
        Ok(())
    }

    /// Resolve the recipient of `messages[index]`, given that all earlier
    /// prefixes are already resolved.
    fn resolve_prefix(&mut self, messages: &mut [ResolvedMessage], index: usize) -> Result<()> {
        if messages[index].is_participant_message() {
            self.participant_indices.push(index);
        }
        let recipient = self.compute_recipient(messages, index)?;
        if let Some(name) = &recipient {
            let role = self.recipient_role(name);
            messages[index].recipient_role = Some(role);
        }
        messages[index].recipient = recipient;
        Ok(())
    }

    fn compute_recipient(
        &self,
        messages: &[ResolvedMessage],
        index: usize,
    ) -> Result<Option<String>> {
        let Some(&last_idx) = self.participant_indices.last() else {
            return Ok(None);
        };
        let last = &messages[last_idx];
        let last_name = if last.name.is_empty() {
            last.role.as_str().to_owned()
        } else {
            last.name.clone()
        };
        let current = &messages[index];

        // 1. Mention.
        if current.role != Role::Tool {
            if let Some(mention) = self.scanner.resolve(&last.content.to_text(), &self.names) {
                if mention != current.name {
                    debug!(index, mention = %mention, "recipient by mention");
                    return Ok(Some(mention));
                }
            }
        }

        // 2. Tool / cell reply threading: the record returns to whoever
        // most recently spoke as a participant.
        if current.role == Role::Tool || current.name == CELL_OUTPUT_NAME {
            debug!(index, caller = %last_name, "recipient by reply threading");
            return Ok(Some(last_name));
        }

        // 3. Resume-after-execution bounce.
        if index >= 2 && messages[index - 1].is_execution_record() {
            let output = &messages[index - 1];
            let requesting_idx = (0..index - 1)
                .rev()
                .find(|&j| !messages[j].is_execution_record())
                .ok_or(ResolveError::MissingRequestingMessage { index })?;
            let bounced = if output.recipient.as_deref() != Some(current.name.as_str()) {
                output.recipient.clone()
            } else {
                messages[requesting_idx].recipient.clone()
            };
            debug!(index, recipient = ?bounced, "recipient by execution bounce");
            return Ok(bounced);
        }

        // 4. Strict alternation.
        if self.participants.len() == 2 && self.participants.contains_key("user") {
            let other = self
                .participants
                .keys()
                .find(|name| **name != last_name)
                .cloned();
            debug!(index, recipient = ?other, "recipient by alternation");
            return Ok(other);
        }

        let last_role = self.resolved_role(&last_name, last.role);

        // 5. An assistant replies to whoever spoke before it.
        if last_role == Role::Assistant && self.participant_indices.len() > 1 {
            let prev_idx = self.participant_indices[self.participant_indices.len() - 2];
            let name = messages[prev_idx].name.clone();
            debug!(index, recipient = %name, "recipient by reply-to-requester");
            return Ok(Some(name));
        }

        // 6. A user re-initiates with the most recent other speaker.
        if last_role == Role::User {
            if let Some(name) = self
                .participant_indices
                .iter()
                .rev()
                .map(|&j| &messages[j])
                .find(|m| m.name != last_name)
                .map(|m| m.name.clone())
            {
                debug!(index, recipient = %name, "recipient by re-initiation");
                return Ok(Some(name));
            }
        }

        // 7. Nobody to address.
        Ok(None)
    }

    /// A participant's effective role: the registry role when known, the
    /// message's own role otherwise.
    fn resolved_role(&self, name: &str, fallback: Role) -> Role {
        self.participants
            .get(name)
            .map_or(fallback, |p| p.role.as_role())
    }

    /// Role recorded for a recipient. A newly-seen name resolves through
    /// the registry, defaulting to assistant; names already resolved keep
    /// their recorded role.
    fn recipient_role(&mut self, name: &str) -> Role {
        if let Some(&role) = self.known_roles.get(name) {
            return role;
        }
        let role = self
            .participants
            .get(name)
            .map_or(Role::Assistant, |p| p.role.as_role());
        let _ = self.known_roles.insert(name.to_owned(), role);
        role
    }
}

/// Final role-reassignment sweep: every message named like the final
/// recipient becomes an assistant, and any message carrying tool calls is
/// an assistant regardless of name.
fn reassign_roles(messages: &mut [ResolvedMessage]) {
    let final_recipient = messages.last().and_then(|m| m.recipient.clone());
    for message in messages.iter_mut() {
        if final_recipient.as_deref() == Some(message.name.as_str()) {
            message.role = Role::Assistant;
        }
        if !message.tool_calls.is_empty() {
            message.role = Role::Assistant;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chatmd_core::messages::ToolCallStep;

    fn registry(entries: &[(&str, Role)]) -> BTreeMap<String, ParticipantConfig> {
        entries
            .iter()
            .map(|(name, role)| {
                let config = match role {
                    Role::Assistant => ParticipantConfig::assistant(*name),
                    _ => ParticipantConfig::user(*name),
                };
                ((*name).to_owned(), config)
            })
            .collect()
    }

    fn msg(name: &str, role: Role, content: &str) -> ResolvedMessage {
        ResolvedMessage::new(name, role, content)
    }

    fn resolve(
        participants: &BTreeMap<String, ParticipantConfig>,
        messages: &mut Vec<ResolvedMessage>,
    ) {
        RecipientResolver::new(participants)
            .resolve_all(messages)
            .unwrap();
    }

    // -- two-party alternation --

    #[test]
    fn two_party_alternation() {
        let participants = registry(&[("user", Role::User), ("assistant1", Role::Assistant)]);
        let mut messages = vec![
            msg("user", Role::User, "question one"),
            msg("assistant1", Role::User, "answer one"),
            msg("user", Role::User, "question two"),
        ];
        resolve(&participants, &mut messages);
        assert_eq!(messages[0].recipient.as_deref(), Some("assistant1"));
        assert_eq!(messages[1].recipient.as_deref(), Some("user"));
        assert_eq!(messages[2].recipient.as_deref(), Some("assistant1"));
    }

    #[test]
    fn alternation_recipients_strictly_alternate() {
        let participants = registry(&[("user", Role::User), ("helper", Role::Assistant)]);
        let mut messages = vec![
            msg("user", Role::User, "a"),
            msg("helper", Role::Assistant, "b"),
            msg("user", Role::User, "c"),
            msg("helper", Role::Assistant, "d"),
        ];
        resolve(&participants, &mut messages);
        let recipients: Vec<&str> = messages
            .iter()
            .map(|m| m.recipient.as_deref().unwrap())
            .collect();
        assert_eq!(recipients, ["helper", "user", "helper", "user"]);
    }

    // -- mentions --

    #[test]
    fn leading_mention_beats_everything() {
        let participants = registry(&[
            ("user", Role::User),
            ("alice", Role::Assistant),
            ("bob", Role::Assistant),
        ]);
        let mut messages = vec![msg(
            "user",
            Role::User,
            "@alice please review what @bob wrote",
        )];
        resolve(&participants, &mut messages);
        assert_eq!(messages[0].recipient.as_deref(), Some("alice"));
    }

    #[test]
    fn greeting_mention_of_unknown_name_wins() {
        let participants = registry(&[("user1", Role::User), ("user2", Role::User)]);
        let mut messages = vec![msg("user1", Role::User, "Hello @user3\nLet's discuss.")];
        resolve(&participants, &mut messages);
        assert_eq!(messages[0].recipient.as_deref(), Some("user3"));
        // Unknown recipients default to the assistant role.
        assert_eq!(messages[0].recipient_role, Some(Role::Assistant));
    }

    #[test]
    fn self_mention_falls_through() {
        let participants = registry(&[("user", Role::User), ("helper", Role::Assistant)]);
        let mut messages = vec![msg("user", Role::User, "@user notes to self")];
        resolve(&participants, &mut messages);
        // The mention resolves to the current speaker, so alternation
        // decides instead.
        assert_eq!(messages[0].recipient.as_deref(), Some("helper"));
    }

    // -- tool threading and bounce --

    #[test]
    fn tool_record_returns_to_caller() {
        let participants = registry(&[("user", Role::User), ("assistant", Role::Assistant)]);
        let mut messages = vec![
            msg("assistant", Role::Assistant, "running the command"),
            msg("run_shell_command", Role::Tool, "OUTPUT"),
        ];
        resolve(&participants, &mut messages);
        assert_eq!(messages[1].recipient.as_deref(), Some("assistant"));
    }

    #[test]
    fn cell_output_returns_to_caller() {
        let participants = registry(&[("user", Role::User), ("assistant", Role::Assistant)]);
        let mut messages = vec![
            msg("assistant", Role::Assistant, "running the cell"),
            msg(CELL_OUTPUT_NAME, Role::User, "###### Cell Output: stdout [c1]\nhi"),
        ];
        resolve(&participants, &mut messages);
        assert_eq!(messages[1].recipient.as_deref(), Some("assistant"));
    }

    #[test]
    fn bounce_after_execution_returns_to_requester_chain() {
        let participants = registry(&[("user", Role::User), ("assistant", Role::Assistant)]);
        let mut messages = vec![
            msg("user", Role::User, "please run it"),
            msg("assistant", Role::Assistant, "on it"),
            msg("run_shell_command", Role::Tool, "OUTPUT"),
            msg("assistant", Role::Assistant, "done, output above"),
        ];
        resolve(&participants, &mut messages);
        // The record returned to the assistant; the assistant's follow-up
        // goes back to the record's recipient's own audience.
        assert_eq!(messages[2].recipient.as_deref(), Some("assistant"));
        assert_eq!(messages[3].recipient.as_deref(), Some("user"));
    }

    #[test]
    fn bounce_prefers_output_recipient_when_current_differs() {
        let participants = registry(&[
            ("user", Role::User),
            ("alice", Role::Assistant),
            ("bob", Role::Assistant),
        ]);
        let mut messages = vec![
            msg("user", Role::User, "alice, run it"),
            msg("alice", Role::User, "running"),
            msg("run_shell_command", Role::Tool, "OUTPUT"),
            msg("user", Role::User, "interjecting"),
        ];
        resolve(&participants, &mut messages);
        // messages[2].recipient is alice (threading); the interjecting
        // user differs from it, so the bounce hands the turn to alice.
        assert_eq!(messages[3].recipient.as_deref(), Some("alice"));
    }

    #[test]
    fn missing_requesting_message_is_an_error() {
        let participants = registry(&[("user", Role::User)]);
        // Execution records only before the current message: the backward
        // scan finds nothing to return to.
        let mut messages = vec![
            msg("run_shell_command", Role::Tool, "OUT 1"),
            msg("run_shell_command", Role::Tool, "OUT 2"),
            msg("user", Role::User, "now what"),
        ];
        let err = RecipientResolver::new(&participants)
            .resolve_all(&mut messages)
            .unwrap_err();
        assert_matches!(err, ResolveError::MissingRequestingMessage { index: 2 });
    }

    // -- assistant replies and re-initiation --

    #[test]
    fn assistant_replies_to_previous_speaker() {
        let participants = registry(&[
            ("alice", Role::User),
            ("bob", Role::User),
            ("helper", Role::Assistant),
        ]);
        let mut messages = vec![
            msg("bob", Role::User, "helper, please summarize"),
            msg("helper", Role::Assistant, "summary follows"),
        ];
        resolve(&participants, &mut messages);
        assert_eq!(messages[1].recipient.as_deref(), Some("bob"));
    }

    #[test]
    fn user_reinitiates_with_most_recent_other_speaker() {
        let participants = registry(&[
            ("alice", Role::User),
            ("bob", Role::User),
            ("carol", Role::User),
        ]);
        let mut messages = vec![
            msg("bob", Role::User, "earlier remark"),
            msg("carol", Role::User, "reply"),
            msg("alice", Role::User, "picking this up"),
        ];
        resolve(&participants, &mut messages);
        assert_eq!(messages[2].recipient.as_deref(), Some("carol"));
    }

    #[test]
    fn lone_message_with_many_participants_has_no_recipient() {
        let participants = registry(&[
            ("alice", Role::User),
            ("bob", Role::User),
            ("carol", Role::User),
        ]);
        let mut messages = vec![msg("alice", Role::User, "anyone here?")];
        resolve(&participants, &mut messages);
        assert_eq!(messages[0].recipient, None);
    }

    #[test]
    fn empty_history_resolves_to_none() {
        let participants = registry(&[]);
        let mut messages: Vec<ResolvedMessage> = Vec::new();
        resolve(&participants, &mut messages);
        assert!(messages.is_empty());
    }

    #[test]
    fn system_only_prefix_has_no_recipient() {
        let participants = registry(&[("user", Role::User), ("helper", Role::Assistant)]);
        let mut messages = vec![ResolvedMessage::system("be nice")];
        resolve(&participants, &mut messages);
        assert_eq!(messages[0].recipient, None);
    }

    // -- prefix stability --

    #[test]
    fn resolution_is_prefix_stable() {
        let participants = registry(&[("user", Role::User), ("helper", Role::Assistant)]);
        let mut four = vec![
            msg("user", Role::User, "a"),
            msg("helper", Role::Assistant, "b"),
            msg("user", Role::User, "c"),
            msg("helper", Role::Assistant, "d"),
        ];
        let mut three: Vec<ResolvedMessage> = four[..3].to_vec();
        resolve(&participants, &mut four);
        resolve(&participants, &mut three);
        for (a, b) in three.iter().zip(&four) {
            assert_eq!(a.recipient, b.recipient);
        }
    }

    // -- final role sweep --

    #[test]
    fn final_recipient_names_are_forced_to_assistant() {
        let participants = registry(&[("user", Role::User), ("helper1", Role::User)]);
        let mut messages = vec![
            msg("helper1", Role::User, "hello"),
            msg("user", Role::User, "@helper1 take it away"),
        ];
        resolve(&participants, &mut messages);
        assert_eq!(messages[1].recipient.as_deref(), Some("helper1"));
        // helper1 spoke with role user, but being the final recipient
        // reassigns every message it authored.
        assert_eq!(messages[0].role, Role::Assistant);
    }

    #[test]
    fn tool_call_carriers_are_forced_to_assistant() {
        let participants = registry(&[("user", Role::User), ("assistant", Role::Assistant)]);
        let mut carrier = msg("user", Role::User, "");
        carrier.tool_calls.push(ToolCallStep {
            id: "1".into(),
            function_name: "run_shell_command".into(),
            arguments: serde_json::Value::Null,
        });
        let mut messages = vec![carrier];
        resolve(&participants, &mut messages);
        assert_eq!(messages[0].role, Role::Assistant);
    }
}
