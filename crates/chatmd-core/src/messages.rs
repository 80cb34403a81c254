//! Message types for the chatmd conversation model.
//!
//! Parsing produces a sequence of [`MessageNode`]s (one per document
//! section), which the message builder flattens into [`ResolvedMessage`]s —
//! the externally visible unit carrying role, content, tool-call steps, and
//! the recipient computed by the resolution engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::CELL_OUTPUT_NAME;
use crate::content::MessageContent;

// ─────────────────────────────────────────────────────────────────────────────
// Roles
// ─────────────────────────────────────────────────────────────────────────────

/// Role of a message.
///
/// `CellOutput` is a transient role produced by the code-cell output header;
/// the message builder always collapses it to `User` (with the message
/// renamed to `cell_output`), so no resolved message leaves the pipeline
/// carrying it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// System instruction.
    System,
    /// Human or human-proxy participant.
    User,
    /// Model participant.
    Assistant,
    /// Tool execution record.
    Tool,
    /// Code-cell output record (transient, collapsed during build).
    CellOutput,
}

impl Role {
    /// Map a reserved participant name to its role, if the name is reserved.
    ///
    /// Only `system`, `user`, `assistant`, and `tool` are reserved;
    /// `cell_output` is a name, not a role alias.
    #[must_use]
    pub fn from_reserved_name(name: &str) -> Option<Self> {
        match name {
            "system" => Some(Self::System),
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            "tool" => Some(Self::Tool),
            _ => None,
        }
    }

    /// Wire name of this role.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
            Self::CellOutput => "cell_output",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool-call steps
// ─────────────────────────────────────────────────────────────────────────────

/// A structured function invocation request emitted by an assistant message.
///
/// Parsed from a `###### Steps` block list item. IDs are unique within a
/// single message's step list; the matching execution record carries the
/// same id in its `tool_call_id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallStep {
    /// Step id, referenced by the paired execution record.
    pub id: String,
    /// Snake-cased function name derived from the step title.
    pub function_name: String,
    /// Parsed JSON arguments.
    pub arguments: Value,
}

// ─────────────────────────────────────────────────────────────────────────────
// Parse nodes
// ─────────────────────────────────────────────────────────────────────────────

/// A chat message section (`**name**` header).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatNode {
    /// Participant name from the header.
    pub name: String,
    /// Role, when the header form implies one.
    pub explicit_role: Option<Role>,
    /// Attributes from the header's inline JSON object.
    pub attributes: Map<String, Value>,
    /// Raw content span, byte-exact.
    pub content: String,
    /// Steps attached from a following `###### Steps` block.
    pub tool_calls: Vec<ToolCallStep>,
}

/// A tool execution record section (`###### Execution:` header).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolExecutionNode {
    /// Snake-cased tool name derived from the header title.
    pub tool_name: String,
    /// Id of the tool-call step this record answers.
    pub tool_call_id: String,
    /// Raw content span, byte-exact.
    pub content: String,
}

/// A code-cell output record section (`###### Cell Output:` header).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellOutputNode {
    /// Output name word from the header.
    pub output_name: String,
    /// Id of the code cell this output belongs to.
    pub cell_id: String,
    /// Raw content span, byte-exact.
    pub content: String,
}

/// A parsed document section.
///
/// Closed tagged union of node kinds; consumers match exhaustively so an
/// unhandled kind is a compile error, not a runtime surprise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MessageNode {
    /// Chat message.
    Chat(ChatNode),
    /// Tool execution record.
    ToolExecution(ToolExecutionNode),
    /// Code-cell output record.
    CellOutput(CellOutputNode),
}

impl MessageNode {
    /// Returns `true` if this is a chat message node.
    #[must_use]
    pub fn is_chat(&self) -> bool {
        matches!(self, Self::Chat(_))
    }

    /// Raw content of the node.
    #[must_use]
    pub fn content(&self) -> &str {
        match self {
            Self::Chat(n) => &n.content,
            Self::ToolExecution(n) => &n.content,
            Self::CellOutput(n) => &n.content,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolved messages
// ─────────────────────────────────────────────────────────────────────────────

/// The externally visible message unit.
///
/// Built from a [`MessageNode`], post-processed for transclusion, and
/// annotated by the recipient resolution engine. Header attributes are
/// flattened onto the serialized object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMessage {
    /// Speaker name.
    pub name: String,
    /// Message role.
    pub role: Role,
    /// Message content.
    pub content: MessageContent,
    /// Participant this message addresses, once resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    /// Role of the recipient, once resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_role: Option<Role>,
    /// Tool-call steps emitted by this message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallStep>,
    /// For tool records: id of the step this record answers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// For cell outputs: id of the producing code cell.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_cell_id: Option<String>,
    /// Per-message attributes from the header's inline JSON object.
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl ResolvedMessage {
    /// Create a message with the given name, role, and content.
    #[must_use]
    pub fn new(name: impl Into<String>, role: Role, content: impl Into<MessageContent>) -> Self {
        Self {
            name: name.into(),
            role,
            content: content.into(),
            recipient: None,
            recipient_role: None,
            tool_calls: Vec::new(),
            tool_call_id: None,
            code_cell_id: None,
            attributes: Map::new(),
        }
    }

    /// Create a system message.
    #[must_use]
    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self::new("system", Role::System, content)
    }

    /// Returns `true` if this message counts as a participant message for
    /// recipient resolution: not a system message, not a tool record, and
    /// not a relabeled cell output.
    #[must_use]
    pub fn is_participant_message(&self) -> bool {
        !matches!(self.role, Role::System | Role::Tool) && self.name != CELL_OUTPUT_NAME
    }

    /// Returns `true` if this message is a tool or cell-output record.
    #[must_use]
    pub fn is_execution_record(&self) -> bool {
        self.role == Role::Tool || self.name == CELL_OUTPUT_NAME
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
