//! # chatmd-core
//!
//! Foundation types for the chatmd conversation engine.
//!
//! This crate provides the shared vocabulary that all other chatmd crates
//! depend on:
//!
//! - **Roles**: `Role` and `ParticipantRole` for message and participant roles
//! - **Messages**: `MessageNode` parse nodes and the flat `ResolvedMessage`
//! - **Content blocks**: `MessageContent` — plain text or text/image parts
//! - **Front matter**: ordered YAML mapping with typed accessors
//! - **Participants**: `ParticipantConfig` and the front-matter spec form
//! - **Code cells**: the fenced, optionally evaluable cell production
//! - **Conversation**: the fully parsed and resolved document

#![deny(unsafe_code)]

pub mod cells;
pub mod constants;
pub mod content;
pub mod conversation;
pub mod front_matter;
pub mod messages;
pub mod participants;

pub use cells::CodeCell;
pub use content::{ContentPart, ImageUrl, MessageContent};
pub use conversation::Conversation;
pub use front_matter::FrontMatter;
pub use messages::{
    CellOutputNode, ChatNode, MessageNode, ResolvedMessage, Role, ToolCallStep,
    ToolExecutionNode,
};
pub use participants::{ParticipantConfig, ParticipantRole, ParticipantSpec};
