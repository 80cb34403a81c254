//! # chatmd-participants
//!
//! The participant registry resolver: who is in the conversation, with
//! what role, system prompt, model, and tools.
//!
//! Participants come from two places — names discovered in user-role
//! history messages, and front-matter declarations — merged with
//! declarations taking precedence. Per-participant configuration lives in
//! markdown definition files (`<dir>/<name>.md`) loaded through
//! [`ParticipantLoader`], with an explicit caller-owned
//! [`ParticipantCache`] validated by file modification time.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod registry;

pub use errors::{ParticipantError, Result};
pub use loader::{
    FsParticipantLoader, ParticipantCache, ParticipantLoader, default_role, parse_definition,
};
pub use registry::resolve_registry;
