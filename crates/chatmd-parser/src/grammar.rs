//! Header grammar and section parsing.
//!
//! Walks the body line by line, validating candidate boundaries located by
//! the segmenter. Alternatives are tried in order — chat message header,
//! execution header, cell-output header, steps header — and the first match
//! wins. Fenced code regions are opaque: a header-shaped line inside a
//! fence never starts a section, and fences are matched by the literal
//! backtick count of their opening line.

use chatmd_core::messages::{
    CellOutputNode, ChatNode, MessageNode, ToolCallStep, ToolExecutionNode,
};
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::{ParseError, Result};
use crate::segment::{CandidateKind, Line, LineIter, candidate_kind, fence_closes, fence_open_len};

/// Parses a document body into ordered message nodes.
pub struct DocumentParser {
    execution: Regex,
    cell_output: Regex,
    steps: Regex,
    step_item: Regex,
}

impl Default for DocumentParser {
    fn default() -> Self {
        Self::new()
    }
}

/// A validated section header.
#[derive(Debug)]
enum SectionHeader {
    /// Synthesized `user` header for a headerless body start.
    Implicit,
    Chat {
        name: String,
        attributes: Map<String, Value>,
    },
    Execution {
        title: String,
        id: String,
    },
    CellOutput {
        name: String,
        id: String,
    },
    Steps,
}

/// A section whose content span is not yet closed.
struct OpenSection {
    header: SectionHeader,
    content_start: usize,
    line: usize,
}

/// A fully delimited section.
struct RawSection {
    header: SectionHeader,
    content_start: usize,
    content_end: usize,
    line: usize,
}

impl OpenSection {
    fn close(self, content_end: usize) -> RawSection {
        RawSection {
            header: self.header,
            content_start: self.content_start,
            content_end,
            line: self.line,
        }
    }
}

impl DocumentParser {
    /// Create a parser with the grammar's compiled patterns.
    #[must_use]
    pub fn new() -> Self {
        Self {
            execution: Regex::new(r"^###### Execution: (.+?) \[([^\]]+)\][ \t]*$").unwrap(),
            cell_output: Regex::new(r"^###### Cell Output: (\S+) \[([^\]]+)\][ \t]*$").unwrap(),
            steps: Regex::new(r"^###### Steps[ \t]*$").unwrap(),
            step_item: Regex::new(r"^- (.+?) \[([^\]]+)\] `(.*)`[ \t]*$").unwrap(),
        }
    }

    /// Parse a document body (front matter already split off) into message
    /// nodes, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Grammar`] when a `###### ` line matches no
    /// alternative, a header's attribute object is invalid JSON, or a steps
    /// block contains a malformed list item.
    pub fn parse_nodes(&self, body: &str) -> Result<Vec<MessageNode>> {
        let sections = self.split_sections(body)?;
        self.assemble(sections, body)
    }

    /// Delimit the body into sections at validated header boundaries.
    ///
    /// Content capture is byte-exact: a section's content runs from just
    /// past its header (or the space that terminates an inline chat header)
    /// up to the start of the next header line, so trailing newlines belong
    /// to the preceding content, not the next header.
    fn split_sections(&self, body: &str) -> Result<Vec<RawSection>> {
        let mut sections = Vec::new();
        let mut open: Option<OpenSection> = None;
        let mut fence: Option<usize> = None;

        for line in LineIter::new(body) {
            if let Some(len) = fence {
                if fence_closes(line.text, len) {
                    fence = None;
                }
                continue;
            }

            let header = match candidate_kind(line.text) {
                Some(CandidateKind::Message) => try_chat_header(&line)?,
                Some(CandidateKind::Heading) => Some(self.parse_heading(&line)?),
                None => None,
            };

            match header {
                Some((header, content_start)) => {
                    if let Some(section) = open.take() {
                        sections.push(section.close(line.start));
                    }
                    open = Some(OpenSection {
                        header,
                        content_start,
                        line: line.number,
                    });
                }
                None => {
                    if open.is_none() {
                        debug!(line = line.number, "synthesizing implicit user header");
                        open = Some(OpenSection {
                            header: SectionHeader::Implicit,
                            content_start: line.start,
                            line: line.number,
                        });
                    }
                    if let Some(len) = fence_open_len(line.text) {
                        fence = Some(len);
                    }
                }
            }
        }

        match open {
            Some(section) => sections.push(section.close(body.len())),
            None if sections.is_empty() => {
                // Empty body: a single implicit user section with no content.
                sections.push(RawSection {
                    header: SectionHeader::Implicit,
                    content_start: 0,
                    content_end: body.len(),
                    line: 1,
                });
            }
            None => {}
        }

        Ok(sections)
    }

    /// Validate a `###### `-candidate against the heading alternatives.
    fn parse_heading(&self, line: &Line<'_>) -> Result<(SectionHeader, usize)> {
        let text = line.text;
        let header = if self.steps.is_match(text) {
            SectionHeader::Steps
        } else if let Some(caps) = self.execution.captures(text) {
            SectionHeader::Execution {
                title: caps[1].to_owned(),
                id: caps[2].to_owned(),
            }
        } else if let Some(caps) = self.cell_output.captures(text) {
            SectionHeader::CellOutput {
                name: caps[1].to_owned(),
                id: caps[2].to_owned(),
            }
        } else {
            let message = if text.starts_with("###### Execution:") {
                "malformed execution header"
            } else if text.starts_with("###### Cell Output:") {
                "malformed cell output header"
            } else {
                "unrecognized section header"
            };
            return Err(ParseError::grammar(line.number, message));
        };
        Ok((header, line.next_start))
    }

    /// Turn delimited sections into message nodes, attaching steps blocks
    /// to the chat message that precedes them.
    fn assemble(&self, sections: Vec<RawSection>, body: &str) -> Result<Vec<MessageNode>> {
        let mut nodes: Vec<MessageNode> = Vec::new();

        for section in sections {
            let content = body[section.content_start..section.content_end].to_owned();
            match section.header {
                SectionHeader::Implicit => {
                    nodes.push(MessageNode::Chat(ChatNode {
                        name: "user".into(),
                        content,
                        ..ChatNode::default()
                    }));
                }
                SectionHeader::Chat { name, attributes } => {
                    nodes.push(MessageNode::Chat(ChatNode {
                        name,
                        attributes,
                        content,
                        ..ChatNode::default()
                    }));
                }
                SectionHeader::Execution { title, id } => {
                    nodes.push(MessageNode::ToolExecution(ToolExecutionNode {
                        tool_name: snake_case(&title),
                        tool_call_id: id,
                        content,
                    }));
                }
                SectionHeader::CellOutput { name, id } => {
                    nodes.push(MessageNode::CellOutput(CellOutputNode {
                        output_name: name,
                        cell_id: id,
                        content,
                    }));
                }
                SectionHeader::Steps => {
                    let steps = self.parse_steps(&content, section.line)?;
                    match nodes.last_mut() {
                        Some(MessageNode::Chat(chat)) => chat.tool_calls.extend(steps),
                        _ => {
                            // A steps block with no chat message before it:
                            // synthesize an empty carrier message.
                            debug!(
                                line = section.line,
                                "steps block without preceding chat message"
                            );
                            nodes.push(MessageNode::Chat(ChatNode {
                                name: "user".into(),
                                tool_calls: steps,
                                ..ChatNode::default()
                            }));
                        }
                    }
                }
            }
        }

        Ok(nodes)
    }

    /// Parse the list items of a `###### Steps` block.
    fn parse_steps(&self, content: &str, header_line: usize) -> Result<Vec<ToolCallStep>> {
        let mut steps = Vec::new();
        for (offset, raw) in content.lines().enumerate() {
            let line_no = header_line + 1 + offset;
            if raw.trim().is_empty() {
                continue;
            }
            let caps = self
                .step_item
                .captures(raw)
                .ok_or_else(|| ParseError::grammar(line_no, "malformed tool-call step"))?;
            let arguments: Value = serde_json::from_str(&caps[3]).map_err(|err| {
                ParseError::grammar(line_no, format!("invalid step arguments: {err}"))
            })?;
            steps.push(ToolCallStep {
                id: caps[2].to_owned(),
                function_name: snake_case(&caps[1]),
                arguments,
            });
        }
        Ok(steps)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Try to validate a `**`-candidate as a chat message header.
///
/// Returns the header and the absolute content start on success, or `None`
/// when the line is ordinary content (emphasis, say). A line that is
/// header-shaped but carries an invalid attribute object is a grammar
/// error, not content.
fn try_chat_header(line: &Line<'_>) -> Result<Option<(SectionHeader, usize)>> {
    let text = line.text;
    let rest = &text[2..];
    let name_len = rest
        .find(|c: char| c.is_whitespace() || c == '{' || c == '*')
        .unwrap_or(rest.len());
    if name_len == 0 {
        return Ok(None);
    }
    let name = &rest[..name_len];
    let mut idx = 2 + name_len;

    let mut attributes = Map::new();
    if text[idx..].starts_with(" {") {
        let Some(object) = scan_balanced_object(&text[idx + 1..]) else {
            return Ok(None);
        };
        attributes = serde_json::from_str(object).map_err(|err| {
            ParseError::grammar(line.number, format!("invalid header attributes: {err}"))
        })?;
        idx += 1 + object.len();
    }

    if !text[idx..].starts_with("**") {
        return Ok(None);
    }
    idx += 2;

    let content_start = match text[idx..].chars().next() {
        // Newline form: content starts on the next line.
        None => line.next_start,
        // Space form: content starts right after the space.
        Some(' ') => line.start + idx + 1,
        Some(_) => return Ok(None),
    };

    Ok(Some((
        SectionHeader::Chat {
            name: name.to_owned(),
            attributes,
        },
        content_start,
    )))
}

/// Scan a balanced JSON object at the start of `s`, respecting strings and
/// escapes. Returns the object slice, or `None` when no balanced object
/// terminates within `s`.
fn scan_balanced_object(s: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, ch) in s.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Normalize a step or execution title into a function name:
/// `Run Shell Command` becomes `run_shell_command`.
#[must_use]
pub fn snake_case(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_sep = false;
    for ch in title.chars() {
        if ch.is_alphanumeric() {
            let camel_boundary = ch.is_uppercase()
                && out.chars().last().is_some_and(|c| c.is_lowercase() || c.is_numeric());
            if (pending_sep && !out.is_empty()) || camel_boundary {
                out.push('_');
            }
            pending_sep = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
