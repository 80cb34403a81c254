//! Code cells — fenced, optionally evaluable code blocks.
//!
//! Cells live inside message content; they are not separate message nodes.
//! Execution is out of scope for this engine: a cell's output is reported
//! back into the document via the `###### Cell Output:` header, which the
//! parser turns into its own record.

use serde::{Deserialize, Serialize};

/// A fenced code cell extracted from message content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeCell {
    /// Language tag from the opening fence.
    pub language: String,
    /// Whether the fence carried the `.eval` marker.
    pub eval: bool,
    /// Cell body, byte-exact, without the fence lines.
    pub body: String,
    /// `true` when the document ended before the closing fence.
    pub truncated: bool,
}

impl CodeCell {
    /// Returns `true` if this cell is marked for evaluation and was fully
    /// fenced.
    #[must_use]
    pub fn is_runnable(&self) -> bool {
        self.eval && !self.truncated
    }
}
