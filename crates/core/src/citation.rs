//! Bibliography entries produced by the citation resolver.

use serde::{Deserialize, Serialize};

use crate::reference::ReferenceRecord;

/// Outcome of resolving one normalized title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CitationStatus {
    Resolved { record: ReferenceRecord },
    /// Lookup failed or found nothing; the entry still gets a key and a
    /// sequence number.
    Unresolved { reason: String },
}

/// One bibliography entry. Written once at the end of resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationEntry {
    /// Dedup key: case-folded, whitespace-collapsed, punctuation removed.
    pub normalized_title: String,
    /// The title as it was first seen in the corpus.
    pub title: String,
    /// Stable key, e.g. `varian1995` or `mackiemason1995b`.
    pub key: String,
    /// 1-based position in the bibliography.
    pub sequence: usize,
    pub status: CitationStatus,
}

impl CitationEntry {
    pub fn is_resolved(&self) -> bool {
        matches!(self.status, CitationStatus::Resolved { .. })
    }

    /// Inline marker, e.g. `[3]`.
    pub fn marker(&self) -> String {
        format!("[{}]", self.sequence)
    }

    /// `Authors (year). Title. Venue.` or `Title (metadata not found).`
    pub fn citation_text(&self) -> String {
        match &self.status {
            CitationStatus::Resolved { record } => {
                let authors = if record.authors.is_empty() {
                    "Unknown author".to_string()
                } else {
                    record
                        .authors
                        .iter()
                        .map(|a| a.display_name())
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                let year = record
                    .year
                    .map(|y| y.to_string())
                    .unwrap_or_else(|| "n.d.".to_string());
                let mut text = format!("{authors} ({year}). {}.", record.title);
                if let Some(venue) = record.venue.as_deref().filter(|v| !v.is_empty()) {
                    text.push(' ');
                    text.push_str(venue);
                    text.push('.');
                }
                text
            }
            CitationStatus::Unresolved { .. } => format!("{} (metadata not found).", self.title),
        }
    }
}
