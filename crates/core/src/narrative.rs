//! Synthesized narrative blocks.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeSection {
    Introduction,
    Discussion,
    Conclusion,
}

impl NarrativeSection {
    pub const ALL: [NarrativeSection; 3] = [
        NarrativeSection::Introduction,
        NarrativeSection::Discussion,
        NarrativeSection::Conclusion,
    ];

    /// Required paragraph count, if the section has one.
    pub fn required_paragraphs(self) -> Option<usize> {
        match self {
            NarrativeSection::Introduction => Some(5),
            NarrativeSection::Conclusion => Some(3),
            NarrativeSection::Discussion => None,
        }
    }

    pub fn heading(self) -> &'static str {
        match self {
            NarrativeSection::Introduction => "Introduction",
            NarrativeSection::Discussion => "Discussion",
            NarrativeSection::Conclusion => "Conclusion",
        }
    }
}

impl std::fmt::Display for NarrativeSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.heading())
    }
}

/// The three narrative blocks of one run, already split into paragraphs and
/// checked against their paragraph contracts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub introduction: Vec<String>,
    pub discussion: Vec<String>,
    pub conclusion: Vec<String>,
}

impl Narrative {
    pub fn section(&self, section: NarrativeSection) -> &[String] {
        match section {
            NarrativeSection::Introduction => &self.introduction,
            NarrativeSection::Discussion => &self.discussion,
            NarrativeSection::Conclusion => &self.conclusion,
        }
    }
}
