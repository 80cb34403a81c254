//! The fully parsed and resolved conversation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::front_matter::FrontMatter;
use crate::messages::ResolvedMessage;
use crate::participants::ParticipantConfig;

/// A parsed markdown chat document.
///
/// Constructed once per completion request from a full text document.
/// Read-only after construction except for the single role-reassignment
/// sweep the resolution engine performs based on the final recipient.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Ordered message list.
    pub messages: Vec<ResolvedMessage>,
    /// Front matter of the document.
    pub front_matter: FrontMatter,
    /// Resolved participant registry.
    pub participants: BTreeMap<String, ParticipantConfig>,
}

impl Conversation {
    /// Recipient of the final message, if any.
    #[must_use]
    pub fn next_recipient(&self) -> Option<&str> {
        self.messages.last().and_then(|m| m.recipient.as_deref())
    }

    /// Configuration of the participant the final message addresses.
    #[must_use]
    pub fn next_participant(&self) -> Option<&ParticipantConfig> {
        self.next_recipient().and_then(|name| self.participants.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Role;

    #[test]
    fn next_recipient_reads_last_message() {
        let mut convo = Conversation::default();
        assert!(convo.next_recipient().is_none());

        let mut msg = ResolvedMessage::new("user", Role::User, "hi");
        msg.recipient = Some("assistant".into());
        convo.messages.push(msg);
        let _ = convo.participants.insert(
            "assistant".into(),
            ParticipantConfig::assistant("assistant"),
        );

        assert_eq!(convo.next_recipient(), Some("assistant"));
        assert_eq!(convo.next_participant().unwrap().name, "assistant");
    }
}
