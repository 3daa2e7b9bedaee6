//! Deterministic merge of narrative, per-paper content and bibliography into
//! one [`DocumentIr`], followed by a structural check of the result.

use std::collections::HashSet;

use dossier_citations::Bibliography;
use dossier_core::{
    Absence, Category, DemandRole, Equation, Narrative, NarrativeSection, Position, Segment,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::ir::{Block, DocumentIr, Section, SectionKind};

/// The processed content of one demand slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotContent {
    /// Copied verbatim.
    Text(String),
    Formulas(Vec<Equation>),
    Listing(Vec<Segment>),
    Absent(Absence),
}

/// One paper after formula parsing and code extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPaper {
    pub title: String,
    pub category: Category,
    pub position: Position,
    /// Indexed by [`DemandRole::index`].
    pub slots: [SlotContent; 8],
}

/// The IR broke one of its ordering or nesting rules. Always a builder
/// defect; never recovered.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StructuralViolation {
    #[error("Expected {expected} at top-level position {index}, found {found}")]
    Outline {
        index: usize,
        expected: String,
        found: String,
    },

    #[error("Section '{heading}' has level {found}, expected {expected}")]
    Level {
        heading: String,
        expected: u8,
        found: u8,
    },

    #[error("Paper '{paper}' has subsections {found:?}, expected a–h in order")]
    Subsections { paper: String, found: Vec<String> },

    #[error("Category '{category}' contains a non-paper section '{heading}'")]
    StrayChild { category: String, heading: String },

    #[error("{section} has {found} paragraphs, expected {expected}")]
    ParagraphCount {
        section: NarrativeSection,
        expected: usize,
        found: usize,
    },

    #[error("Discussion is empty")]
    EmptyDiscussion,

    #[error("Paper '{0}' has no bibliography entry")]
    MissingCitation(String),

    #[error("Paper '{paper}' cites key '{key}' which is not in the bibliography")]
    DanglingKey { paper: String, key: String },

    #[error("Bibliography entry {position} carries sequence number {found}")]
    Sequence { position: usize, found: usize },

    #[error("Bibliography lists '{0}' more than once")]
    DuplicateEntry(String),
}

pub struct DocumentBuilder {
    title: String,
}

impl DocumentBuilder {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    pub fn build(
        &self,
        narrative: &Narrative,
        mut papers: Vec<RenderedPaper>,
        bibliography: &Bibliography,
    ) -> Result<DocumentIr, StructuralViolation> {
        papers.sort_by_key(|p| p.position);

        let mut sections = Vec::with_capacity(Category::ALL.len() + 4);
        sections.push(narrative_section(
            NarrativeSection::Introduction,
            &narrative.introduction,
        ));

        for category in Category::ALL {
            let mut section = Section::new(1, category.label(), SectionKind::Category { category });
            for paper in papers.iter().filter(|p| p.category == category) {
                section.children.push(paper_section(paper, bibliography)?);
            }
            debug!(category = %category, papers = section.children.len(), "Category assembled");
            sections.push(section);
        }

        sections.push(narrative_section(
            NarrativeSection::Discussion,
            &narrative.discussion,
        ));
        sections.push(narrative_section(
            NarrativeSection::Conclusion,
            &narrative.conclusion,
        ));

        let mut references = Section::new(1, "Bibliography", SectionKind::Bibliography);
        references.content = bibliography
            .entries()
            .iter()
            .map(|entry| Block::Reference {
                entry: entry.clone(),
            })
            .collect();
        sections.push(references);

        let doc = DocumentIr {
            title: self.title.clone(),
            sections,
        };
        validate(&doc)?;
        info!(
            papers = papers.len(),
            references = bibliography.len(),
            "Document tree built"
        );
        Ok(doc)
    }
}

fn narrative_section(section: NarrativeSection, paragraphs: &[String]) -> Section {
    let kind = match section {
        NarrativeSection::Introduction => SectionKind::Introduction,
        NarrativeSection::Discussion => SectionKind::Discussion,
        NarrativeSection::Conclusion => SectionKind::Conclusion,
    };
    let mut out = Section::new(1, section.heading(), kind);
    out.content = paragraphs.iter().map(|p| Block::paragraph(p.as_str())).collect();
    out
}

fn paper_section(
    paper: &RenderedPaper,
    bibliography: &Bibliography,
) -> Result<Section, StructuralViolation> {
    let entry = bibliography
        .get(&paper.title)
        .ok_or_else(|| StructuralViolation::MissingCitation(paper.title.clone()))?;

    let mut section = Section::new(
        2,
        paper.title.as_str(),
        SectionKind::Paper {
            citation_key: entry.key.clone(),
            resolved: entry.is_resolved(),
        },
    );
    section.marker = Some(entry.marker());

    for role in DemandRole::ALL {
        let mut sub = Section::new(3, role.heading(), SectionKind::Subsection { role });
        sub.content = match &paper.slots[role.index()] {
            SlotContent::Text(text) => vec![Block::paragraph(text.trim())],
            SlotContent::Formulas(equations) => equations
                .iter()
                .map(|e| Block::Equation {
                    equation: e.clone(),
                })
                .collect(),
            SlotContent::Listing(segments) => segments
                .iter()
                .map(|s| match s {
                    Segment::Prose { text } => Block::paragraph(text.as_str()),
                    Segment::Code { block } => Block::Code {
                        code: block.clone(),
                    },
                })
                .collect(),
            SlotContent::Absent(reason) => vec![Block::Placeholder {
                role,
                reason: *reason,
            }],
        };
        section.children.push(sub);
    }
    Ok(section)
}

// ── Validation ────────────────────────────────────────────────────────────

fn kind_label(kind: &SectionKind) -> String {
    match kind {
        SectionKind::Introduction => "Introduction".into(),
        SectionKind::Category { category } => format!("category {category}"),
        SectionKind::Paper { .. } => "a paper".into(),
        SectionKind::Subsection { role } => format!("subsection {}", role.letter()),
        SectionKind::Discussion => "Discussion".into(),
        SectionKind::Conclusion => "Conclusion".into(),
        SectionKind::Bibliography => "Bibliography".into(),
    }
}

fn expected_outline() -> Vec<SectionKind> {
    let mut outline = vec![SectionKind::Introduction];
    outline.extend(
        Category::ALL
            .into_iter()
            .map(|category| SectionKind::Category { category }),
    );
    outline.extend([
        SectionKind::Discussion,
        SectionKind::Conclusion,
        SectionKind::Bibliography,
    ]);
    outline
}

fn check_level(section: &Section, expected: u8) -> Result<(), StructuralViolation> {
    if section.level != expected {
        return Err(StructuralViolation::Level {
            heading: section.heading(),
            expected,
            found: section.level,
        });
    }
    Ok(())
}

/// Check every ordering, nesting and bibliography rule of the IR.
pub fn validate(doc: &DocumentIr) -> Result<(), StructuralViolation> {
    let outline = expected_outline();
    for (index, expected) in outline.iter().enumerate() {
        let found = doc.sections.get(index).map(|s| &s.kind);
        if found != Some(expected) {
            return Err(StructuralViolation::Outline {
                index,
                expected: kind_label(expected),
                found: found.map_or_else(|| "end of document".into(), kind_label),
            });
        }
    }
    if let Some(extra) = doc.sections.get(outline.len()) {
        return Err(StructuralViolation::Outline {
            index: outline.len(),
            expected: "end of document".into(),
            found: kind_label(&extra.kind),
        });
    }

    for section in &doc.sections {
        check_level(section, 1)?;
        match &section.kind {
            SectionKind::Introduction => check_paragraphs(section, NarrativeSection::Introduction)?,
            SectionKind::Conclusion => check_paragraphs(section, NarrativeSection::Conclusion)?,
            SectionKind::Discussion if section.paragraphs().next().is_none() => {
                return Err(StructuralViolation::EmptyDiscussion);
            }
            SectionKind::Category { .. } => {
                for paper in &section.children {
                    check_paper(section, paper)?;
                }
            }
            _ => {}
        }
    }

    check_bibliography(doc)
}

fn check_paragraphs(section: &Section, which: NarrativeSection) -> Result<(), StructuralViolation> {
    let found = section.paragraphs().count();
    match which.required_paragraphs() {
        Some(expected) if expected != found => Err(StructuralViolation::ParagraphCount {
            section: which,
            expected,
            found,
        }),
        _ => Ok(()),
    }
}

fn check_paper(category: &Section, paper: &Section) -> Result<(), StructuralViolation> {
    if !matches!(paper.kind, SectionKind::Paper { .. }) {
        return Err(StructuralViolation::StrayChild {
            category: category.title.clone(),
            heading: paper.heading(),
        });
    }
    check_level(paper, 2)?;

    let roles: Vec<Option<DemandRole>> = paper
        .children
        .iter()
        .map(|s| match s.kind {
            SectionKind::Subsection { role } => Some(role),
            _ => None,
        })
        .collect();
    let in_order = roles.len() == DemandRole::ALL.len()
        && roles
            .iter()
            .zip(DemandRole::ALL)
            .all(|(found, want)| *found == Some(want));
    if !in_order {
        return Err(StructuralViolation::Subsections {
            paper: paper.title.clone(),
            found: paper.children.iter().map(|s| kind_label(&s.kind)).collect(),
        });
    }
    for sub in &paper.children {
        check_level(sub, 3)?;
    }
    Ok(())
}

fn check_bibliography(doc: &DocumentIr) -> Result<(), StructuralViolation> {
    let entries = doc.bibliography();
    let mut keys = HashSet::new();
    let mut titles = HashSet::new();
    for (i, entry) in entries.iter().enumerate() {
        if entry.sequence != i + 1 {
            return Err(StructuralViolation::Sequence {
                position: i + 1,
                found: entry.sequence,
            });
        }
        if !keys.insert(entry.key.as_str()) || !titles.insert(entry.normalized_title.as_str()) {
            return Err(StructuralViolation::DuplicateEntry(entry.title.clone()));
        }
    }

    for paper in doc.papers() {
        if let SectionKind::Paper { citation_key, .. } = &paper.kind
            && !keys.contains(citation_key.as_str())
        {
            return Err(StructuralViolation::DanglingKey {
                paper: paper.title.clone(),
                key: citation_key.clone(),
            });
        }
    }
    Ok(())
}
