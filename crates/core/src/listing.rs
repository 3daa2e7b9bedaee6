//! Code listings extracted from demand bodies.

use serde::{Deserialize, Serialize};

/// How a code span was recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeOrigin {
    /// A ```/~~~ fence.
    Fenced,
    /// A run of code-like lines with no fence.
    Heuristic,
}

/// A block of source code. Never executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    pub language: String,
    pub lines: Vec<String>,
    pub origin: CodeOrigin,
}

impl CodeBlock {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Prose or code, in the order they appear in the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    Prose { text: String },
    Code { block: CodeBlock },
}

impl Segment {
    pub fn as_code(&self) -> Option<&CodeBlock> {
        match self {
            Segment::Code { block } => Some(block),
            Segment::Prose { .. } => None,
        }
    }
}
