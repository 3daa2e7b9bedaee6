//! The document intermediate representation.
//!
//! A tree of headed sections. Level 1 holds the introduction, the four
//! categories, discussion, conclusion and bibliography; level 2 holds papers;
//! level 3 holds the eight lettered subsections of a paper.

use dossier_core::{Absence, Category, CitationEntry, CodeBlock, DemandRole, Equation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentIr {
    pub title: String,
    pub sections: Vec<Section>,
}

impl DocumentIr {
    /// Top-level section of the given kind, if present.
    pub fn find(&self, pred: impl Fn(&SectionKind) -> bool) -> Option<&Section> {
        self.sections.iter().find(|s| pred(&s.kind))
    }

    /// Every paper section, in document order.
    pub fn papers(&self) -> impl Iterator<Item = &Section> {
        self.sections
            .iter()
            .filter(|s| matches!(s.kind, SectionKind::Category { .. }))
            .flat_map(|c| c.children.iter())
    }

    /// Entries of the bibliography section, in order.
    pub fn bibliography(&self) -> Vec<&CitationEntry> {
        self.find(|k| matches!(k, SectionKind::Bibliography))
            .map(|s| {
                s.content
                    .iter()
                    .filter_map(|b| match b {
                        Block::Reference { entry } => Some(entry),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionKind {
    Introduction,
    Category { category: Category },
    Paper { citation_key: String, resolved: bool },
    Subsection { role: DemandRole },
    Discussion,
    Conclusion,
    Bibliography,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Heading level, 1–3.
    pub level: u8,
    pub title: String,
    pub kind: SectionKind,
    /// Inline citation marker appended to the heading, e.g. `[2]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Block>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Section>,
}

impl Section {
    pub fn new(level: u8, title: impl Into<String>, kind: SectionKind) -> Self {
        Self {
            level,
            title: title.into(),
            kind,
            marker: None,
            content: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Heading text including the marker.
    pub fn heading(&self) -> String {
        match &self.marker {
            Some(marker) => format!("{} {marker}", self.title),
            None => self.title.clone(),
        }
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.content.iter().filter_map(|b| match b {
            Block::Paragraph { text } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "block", rename_all = "snake_case")]
pub enum Block {
    Paragraph { text: String },
    Equation { equation: Equation },
    Code { code: CodeBlock },
    /// Stand-in for a subsection whose demand was unavailable.
    Placeholder { role: DemandRole, reason: Absence },
    Reference { entry: CitationEntry },
}

impl Block {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph { text: text.into() }
    }
}
