//! # chatmd-parser
//!
//! The markdown chat grammar: a bespoke plain-text conversation format
//! parsed into a structured, ordered message list.
//!
//! Pipeline, in order:
//!
//! - **Front-matter splitter** — detects and parses a leading
//!   `---`-delimited YAML block; the body is returned untouched
//! - **Segmenter** — locates candidate section boundaries (`**` message
//!   headers, `###### ` execution-family headers) at line starts
//! - **Grammar parser** — validates candidates, keeps fenced code regions
//!   opaque, and produces typed message nodes
//! - **Message builder** — flattens nodes into resolved messages with role
//!   defaults, cell-output relabeling, and adjacent-duplicate supersession
//!
//! Recipient resolution and content post-processing live in their own
//! crates; this one is a pure, synchronous text→structure transform.

#![deny(unsafe_code)]

pub mod builder;
pub mod cells;
pub mod errors;
pub mod front_matter;
pub mod grammar;
pub mod segment;

pub use builder::{build_body_messages, build_messages};
pub use cells::extract_code_cells;
pub use errors::{ParseError, Result};
pub use front_matter::split_front_matter;
pub use grammar::{DocumentParser, snake_case};
pub use segment::{Candidate, CandidateKind, Segmenter};

use chatmd_core::{FrontMatter, ResolvedMessage};

/// A parsed document: front matter plus the built message list.
///
/// Messages are not yet post-processed for transclusion and carry no
/// recipients; those stages belong to the engine pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedDocument {
    /// Front matter of the document.
    pub front_matter: FrontMatter,
    /// Built messages, in document order.
    pub messages: Vec<ResolvedMessage>,
}

impl DocumentParser {
    /// Parse a complete document: split front matter, parse the body into
    /// nodes, and build the message list.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] on malformed front matter or any grammar
    /// failure; there is no partial-document recovery.
    pub fn parse(&self, input: &str) -> Result<ParsedDocument> {
        let (front_matter, body) = split_front_matter(input)?;
        let nodes = self.parse_nodes(body)?;
        let messages = build_messages(&front_matter, nodes);
        Ok(ParsedDocument {
            front_matter,
            messages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatmd_core::messages::Role;

    #[test]
    fn full_document_parse() {
        let input = "---\nsystem: Be brief.\n---\n**user** Hello!\n\n**assistant** Hi.\n";
        let doc = DocumentParser::new().parse(input).unwrap();
        assert_eq!(doc.front_matter.system(), Some("Be brief."));
        assert_eq!(doc.messages.len(), 3);
        assert_eq!(doc.messages[0].role, Role::System);
        assert_eq!(doc.messages[1].content.as_text(), Some("Hello!\n\n"));
        assert_eq!(doc.messages[2].role, Role::Assistant);
    }

    #[test]
    fn section_count_matches_message_count() {
        let input = "**user** a\n**assistant** b\n**user** c\n";
        let doc = DocumentParser::new().parse(input).unwrap();
        assert_eq!(doc.messages.len(), 3);
    }
}
