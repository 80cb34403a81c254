//! Message building.
//!
//! Flattens parsed nodes into the flat ordered message list:
//!
//! 1. prepend a synthetic system message when front matter declares one
//! 2. carry explicit roles from headers; apply header-attribute overrides
//! 3. derive missing roles from reserved names, defaulting to `user`
//! 4. collapse transient cell-output records into relabeled user messages
//! 5. drop assistant messages superseded by an adjacent same-name one

use chatmd_core::FrontMatter;
use chatmd_core::constants::CELL_OUTPUT_NAME;
use chatmd_core::messages::{MessageNode, ResolvedMessage, Role, ToolCallStep};
use serde_json::{Map, Value};
use tracing::debug;

/// Build the resolved message list for a document.
///
/// Equivalent to [`build_body_messages`] with a synthetic system message
/// prepended when the front matter declares `system` text.
#[must_use]
pub fn build_messages(front_matter: &FrontMatter, nodes: Vec<MessageNode>) -> Vec<ResolvedMessage> {
    let mut messages = Vec::with_capacity(nodes.len() + 1);
    if let Some(system) = front_matter.system() {
        messages.push(ResolvedMessage::system(system));
    }
    messages.extend(build_body_messages(nodes));
    messages
}

/// Build resolved messages from body nodes alone, without front matter.
///
/// Participant definition files use this form: their front matter carries
/// configuration, not a conversation system message.
#[must_use]
pub fn build_body_messages(nodes: Vec<MessageNode>) -> Vec<ResolvedMessage> {
    let drafts: Vec<Draft> = nodes.into_iter().map(Draft::from_node).collect();
    let drafts = assign_roles(drafts);
    let drafts = relabel_cell_outputs(drafts);
    let drafts = drop_superseded_assistants(drafts);
    drafts.into_iter().map(Draft::into_message).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Draft messages
// ─────────────────────────────────────────────────────────────────────────────

/// A message under construction; `role` stays unset until the role pass.
struct Draft {
    name: String,
    role: Option<Role>,
    content: String,
    tool_calls: Vec<ToolCallStep>,
    tool_call_id: Option<String>,
    code_cell_id: Option<String>,
    attributes: Map<String, Value>,
    cell_output_name: Option<String>,
}

impl Draft {
    fn from_node(node: MessageNode) -> Self {
        match node {
            MessageNode::Chat(chat) => {
                let mut attributes = chat.attributes;
                let mut name = chat.name;
                let mut role = chat.explicit_role;
                // Header attributes may override name and role.
                if let Some(Value::String(override_name)) = attributes.get("name") {
                    name = override_name.clone();
                    let _ = attributes.remove("name");
                }
                if let Some(override_role) = attributes
                    .get("role")
                    .and_then(Value::as_str)
                    .and_then(Role::from_reserved_name)
                {
                    role = Some(override_role);
                    let _ = attributes.remove("role");
                }
                Self {
                    name,
                    role,
                    content: chat.content,
                    tool_calls: chat.tool_calls,
                    tool_call_id: None,
                    code_cell_id: None,
                    attributes,
                    cell_output_name: None,
                }
            }
            MessageNode::ToolExecution(exec) => Self {
                name: exec.tool_name,
                role: Some(Role::Tool),
                content: exec.content,
                tool_calls: Vec::new(),
                tool_call_id: Some(exec.tool_call_id),
                code_cell_id: None,
                attributes: Map::new(),
                cell_output_name: None,
            },
            MessageNode::CellOutput(cell) => Self {
                name: cell.output_name.clone(),
                role: Some(Role::CellOutput),
                content: cell.content,
                tool_calls: Vec::new(),
                tool_call_id: None,
                code_cell_id: Some(cell.cell_id),
                attributes: Map::new(),
                cell_output_name: Some(cell.output_name),
            },
        }
    }

    fn into_message(self) -> ResolvedMessage {
        ResolvedMessage {
            name: self.name,
            role: self.role.unwrap_or(Role::User),
            content: self.content.into(),
            recipient: None,
            recipient_role: None,
            tool_calls: self.tool_calls,
            tool_call_id: self.tool_call_id,
            code_cell_id: self.code_cell_id,
            attributes: self.attributes,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Passes
// ─────────────────────────────────────────────────────────────────────────────

/// Fill in missing roles from reserved names, defaulting to `user`.
fn assign_roles(mut drafts: Vec<Draft>) -> Vec<Draft> {
    for draft in &mut drafts {
        if draft.role.is_none() {
            draft.role = Some(Role::from_reserved_name(&draft.name).unwrap_or(Role::User));
        }
    }
    drafts
}

/// Collapse transient cell-output records: rename to `cell_output`, demote
/// to `user`, and prefix the content with a synthesized header line so the
/// producing cell stays identifiable in flattened form.
fn relabel_cell_outputs(mut drafts: Vec<Draft>) -> Vec<Draft> {
    for draft in &mut drafts {
        if draft.role != Some(Role::CellOutput) {
            continue;
        }
        let output_name = draft.cell_output_name.as_deref().unwrap_or(&draft.name);
        let cell_id = draft.code_cell_id.as_deref().unwrap_or_default();
        draft.content = format!(
            "###### Cell Output: {output_name} [{cell_id}]\n{}",
            draft.content
        );
        draft.name = CELL_OUTPUT_NAME.to_owned();
        draft.role = Some(Role::User);
    }
    drafts
}

/// Drop an assistant message when the structurally next message is an
/// assistant message with the same name: the later one supersedes it (a
/// streamed render finalized by a re-emit). Only strictly adjacent pairs
/// collapse; an identical earlier, non-adjacent message survives.
fn drop_superseded_assistants(drafts: Vec<Draft>) -> Vec<Draft> {
    let mut out: Vec<Draft> = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let superseded = out.last().is_some_and(|prev: &Draft| {
            prev.role == Some(Role::Assistant)
                && draft.role == Some(Role::Assistant)
                && prev.name == draft.name
        });
        if superseded {
            debug!(name = %draft.name, "dropping superseded assistant message");
            let _ = out.pop();
        }
        out.push(draft);
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
