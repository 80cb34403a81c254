//! Mention parsing.
//!
//! Mentions are `@word` tokens not preceded by a word character, so email
//! addresses never count. Resolution priority:
//!
//! 1. content that starts with a mention — wins outright, known or not
//! 2. a greeting line (`Hey @name`, `Hi @name`, `Hello @name`) — wins,
//!    known or not
//! 3. exactly one mentioned known participant — wins
//! 4. several mentioned known participants — the last one wins
//!
//! Malformed mention syntax never fails; it simply fails to match.

use std::collections::BTreeSet;

use regex::Regex;

/// Scans message content for mention tokens.
pub struct MentionScanner {
    leading: Regex,
    greeting: Regex,
    token: Regex,
}

impl Default for MentionScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl MentionScanner {
    /// Compile the mention patterns.
    #[must_use]
    pub fn new() -> Self {
        Self {
            leading: Regex::new(r"^@(\w+)").unwrap(),
            greeting: Regex::new(r"(?m)^(?:Hey|Hi|Hello)[ \t]+@(\w+)").unwrap(),
            token: Regex::new(r"(?:^|[^\w])@(\w+)").unwrap(),
        }
    }

    /// All mention tokens in `content`, in document order.
    #[must_use]
    pub fn mentions(&self, content: &str) -> Vec<String> {
        self.token
            .captures_iter(content)
            .map(|caps| caps[1].to_owned())
            .collect()
    }

    /// Resolve the mention a message addresses, if any.
    #[must_use]
    pub fn resolve(&self, content: &str, participants: &BTreeSet<String>) -> Option<String> {
        if let Some(caps) = self.leading.captures(content) {
            return Some(caps[1].to_owned());
        }
        if let Some(caps) = self.greeting.captures(content) {
            return Some(caps[1].to_owned());
        }

        let known: Vec<String> = self
            .mentions(content)
            .into_iter()
            .filter(|name| participants.contains(name))
            .collect();
        let distinct: BTreeSet<&String> = known.iter().collect();
        match distinct.len() {
            0 => None,
            1 => known.into_iter().next(),
            _ => known.into_iter().next_back(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
