//! Per-run diagnostic log for recoverable degradations.
//!
//! Diagnostics are data returned with the document, not just log lines.
//! Each one is also emitted at `warn!` when recorded.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::corpus::{DemandRole, PaperRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A fragment file, category folder or body was missing.
    MissingInput,
    /// A formula or code span fell back to verbatim text.
    ParseDegraded,
    /// A citation could not be resolved.
    LookupFailure,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingInput => f.write_str("MissingInput"),
            Self::ParseDegraded => f.write_str("ParseDegraded"),
            Self::LookupFailure => f.write_str("LookupFailure"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paper: Option<PaperRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<DemandRole>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            paper: None,
            role: None,
            message: message.into(),
        }
    }

    pub fn for_paper(mut self, paper: PaperRef) -> Self {
        self.paper = Some(paper);
        self
    }

    pub fn for_role(mut self, role: DemandRole) -> Self {
        self.role = Some(role);
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(paper) = &self.paper {
            write!(f, " [{paper}")?;
            if let Some(role) = self.role {
                write!(f, ", role {role}")?;
            }
            f.write_str("]")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Ordered collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagnosticLog {
    entries: Vec<Diagnostic>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and emit it as a warning.
    pub fn record(&mut self, diagnostic: Diagnostic) {
        warn!(
            kind = %diagnostic.kind,
            paper = diagnostic.paper.as_ref().map(|p| p.title.as_str()).unwrap_or("-"),
            role = diagnostic.role.map(|r| r.number()).unwrap_or(0),
            "{}",
            diagnostic.message
        );
        self.entries.push(diagnostic);
    }

    /// Append another log's entries without re-emitting them.
    pub fn merge(&mut self, other: DiagnosticLog) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }
}

impl IntoIterator for DiagnosticLog {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
