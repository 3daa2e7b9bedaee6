//! Corpus domain model: categories, papers and their eight demand slots.
//!
//! The corpus is `Category → Paper → Slot[8]`. Both axes are closed enums so
//! that "every paper has exactly eight roles" and "there are exactly four
//! categories" hold by construction.

use serde::{Deserialize, Serialize};

// ── Category ──────────────────────────────────────────────────────────────

/// One of the four fixed topical/temporal categories, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "internet_pricing_1990_2000")]
    InternetPricing1990s,
    #[serde(rename = "bandwidth_pricing_1990_2000")]
    BandwidthPricing1990s,
    #[serde(rename = "internet_pricing_2000_2010")]
    InternetPricing2000s,
    #[serde(rename = "bandwidth_pricing_2000_2010")]
    BandwidthPricing2000s,
}

impl Category {
    /// All categories in the order they appear in the document.
    pub const ALL: [Category; 4] = [
        Category::InternetPricing1990s,
        Category::BandwidthPricing1990s,
        Category::InternetPricing2000s,
        Category::BandwidthPricing2000s,
    ];

    /// The folder name under the corpus root.
    pub fn folder_name(self) -> &'static str {
        match self {
            Self::InternetPricing1990s => "internet_pricing_1990_2000",
            Self::BandwidthPricing1990s => "bandwidth_pricing_1990_2000",
            Self::InternetPricing2000s => "internet_pricing_2000_2010",
            Self::BandwidthPricing2000s => "bandwidth_pricing_2000_2010",
        }
    }

    /// The heading text used in the document.
    pub fn label(self) -> &'static str {
        match self {
            Self::InternetPricing1990s => "internet pricing (from 1990 to 2000)",
            Self::BandwidthPricing1990s => "bandwidth pricing (from 1990 to 2000)",
            Self::InternetPricing2000s => "internet pricing (from 2000 to 2010)",
            Self::BandwidthPricing2000s => "bandwidth pricing (from 2000 to 2010)",
        }
    }

    pub fn from_folder_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.folder_name() == name)
    }

    /// Zero-based position in [`Category::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.folder_name())
    }
}

// ── Demand roles ──────────────────────────────────────────────────────────

/// How a demand body is turned into document content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Copied verbatim.
    Text,
    /// Parsed by the formula parser.
    Formulas,
    /// Segmented by the code extractor.
    Code,
}

/// The eight fixed semantic roles, numbered 1–8 and lettered a–h.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandRole {
    Explanation,
    Formulas,
    MonteCarloAlgorithm,
    MonteCarloCode,
    AiChoice,
    AiCode,
    Dataset,
    Findings,
}

impl DemandRole {
    /// All roles in subsection order.
    pub const ALL: [DemandRole; 8] = [
        DemandRole::Explanation,
        DemandRole::Formulas,
        DemandRole::MonteCarloAlgorithm,
        DemandRole::MonteCarloCode,
        DemandRole::AiChoice,
        DemandRole::AiCode,
        DemandRole::Dataset,
        DemandRole::Findings,
    ];

    /// The 1-based role number used in fragment headers.
    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1..=8 => Some(Self::ALL[usize::from(n - 1)]),
            _ => None,
        }
    }

    /// Subsection letter a–h.
    pub fn letter(self) -> char {
        (b'a' + self as u8) as char
    }

    /// Zero-based slot index.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Fixed level-3 heading for this subsection.
    pub fn heading(self) -> &'static str {
        match self {
            Self::Explanation => "a) Explanation of the pricing model proposed in this paper",
            Self::Formulas => "b) Mathematical formulas",
            Self::MonteCarloAlgorithm => {
                "c) Step-by-step algorithm to perform a Monte Carlo simulation"
            }
            Self::MonteCarloCode => "d) Python code that implements the Monte Carlo simulation",
            Self::AiChoice => {
                "e) Best machine learning or AI algorithm to predict internet prices based on this model"
            }
            Self::AiCode => "f) Python code for that AI algorithm",
            Self::Dataset => {
                "g) Kaggle dataset (or library) that could be used to train the AI model"
            }
            Self::Findings => "h) Key findings",
        }
    }

    pub fn content_kind(self) -> ContentKind {
        match self {
            Self::Formulas => ContentKind::Formulas,
            Self::MonteCarloCode | Self::AiCode => ContentKind::Code,
            _ => ContentKind::Text,
        }
    }
}

impl std::fmt::Display for DemandRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

// ── Demand / Slot ─────────────────────────────────────────────────────────

/// One fragment body. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demand {
    role: DemandRole,
    body: String,
}

impl Demand {
    pub fn new(role: DemandRole, body: impl Into<String>) -> Self {
        Self {
            role,
            body: body.into(),
        }
    }

    pub fn role(&self) -> DemandRole {
        self.role
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Why a slot has no usable demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Absence {
    /// No fragment file carried this role.
    MissingFile,
    /// The fragment existed but its body was blank.
    EmptyBody,
}

impl std::fmt::Display for Absence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Absence::MissingFile => f.write_str("fragment file missing"),
            Absence::EmptyBody => f.write_str("fragment body empty"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Slot {
    Present { demand: Demand },
    Absent { reason: Absence },
}

impl Slot {
    pub fn demand(&self) -> Option<&Demand> {
        match self {
            Slot::Present { demand } => Some(demand),
            Slot::Absent { .. } => None,
        }
    }
}

// ── Paper ─────────────────────────────────────────────────────────────────

/// Where a paper sits in the fixed category→paper traversal.
///
/// Ordering on `Position` is traversal order, which is what "first seen"
/// means for the bibliography.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub category: usize,
    pub paper: usize,
}

/// A lightweight reference to a paper, carried by diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRef {
    pub category: Category,
    pub folder: String,
    pub title: String,
}

impl std::fmt::Display for PaperRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} ({})", self.category, self.folder, self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    pub title: String,
    /// Folder name under the category directory.
    pub folder: String,
    pub category: Category,
    pub position: Position,
    slots: [Slot; 8],
}

impl Paper {
    pub fn new(
        title: impl Into<String>,
        folder: impl Into<String>,
        category: Category,
        position: Position,
        slots: [Slot; 8],
    ) -> Self {
        Self {
            title: title.into(),
            folder: folder.into(),
            category,
            position,
            slots,
        }
    }

    pub fn slot(&self, role: DemandRole) -> &Slot {
        &self.slots[role.index()]
    }

    pub fn demand(&self, role: DemandRole) -> Option<&Demand> {
        self.slot(role).demand()
    }

    /// Roles paired with their slots, in a–h order.
    pub fn slots(&self) -> impl Iterator<Item = (DemandRole, &Slot)> {
        DemandRole::ALL.into_iter().zip(self.slots.iter())
    }

    /// True when all eight slots carry a non-empty body.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(|s| s.demand().is_some())
    }

    pub fn reference(&self) -> PaperRef {
        PaperRef {
            category: self.category,
            folder: self.folder.clone(),
            title: self.title.clone(),
        }
    }
}

// ── Corpus ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPapers {
    pub category: Category,
    pub papers: Vec<Paper>,
}

/// The loaded corpus: always four categories, in [`Category::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    categories: Vec<CategoryPapers>,
}

impl Corpus {
    /// Build a corpus from per-category paper lists. Categories that are not
    /// supplied end up empty; order always follows [`Category::ALL`].
    pub fn new(mut supplied: Vec<CategoryPapers>) -> Self {
        let categories = Category::ALL
            .into_iter()
            .map(|category| {
                let papers = supplied
                    .iter_mut()
                    .find(|c| c.category == category)
                    .map(|c| std::mem::take(&mut c.papers))
                    .unwrap_or_default();
                CategoryPapers { category, papers }
            })
            .collect();
        Self { categories }
    }

    pub fn categories(&self) -> &[CategoryPapers] {
        &self.categories
    }

    /// Every paper in traversal order.
    pub fn papers(&self) -> impl Iterator<Item = &Paper> {
        self.categories.iter().flat_map(|c| c.papers.iter())
    }

    pub fn paper_count(&self) -> usize {
        self.categories.iter().map(|c| c.papers.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_slots() -> [Slot; 8] {
        std::array::from_fn(|i| Slot::Present {
            demand: Demand::new(DemandRole::ALL[i], format!("body {}", i + 1)),
        })
    }

    #[test]
    fn roles_number_and_letter() {
        assert_eq!(DemandRole::Explanation.number(), 1);
        assert_eq!(DemandRole::Findings.number(), 8);
        assert_eq!(DemandRole::AiCode.letter(), 'f');
        assert_eq!(DemandRole::from_number(6), Some(DemandRole::AiCode));
        assert_eq!(DemandRole::from_number(0), None);
        assert_eq!(DemandRole::from_number(9), None);
    }

    #[test]
    fn headings_are_lettered_in_order() {
        for role in DemandRole::ALL {
            assert!(role.heading().starts_with(&format!("{})", role.letter())));
        }
    }

    #[test]
    fn content_kinds() {
        assert_eq!(DemandRole::Formulas.content_kind(), ContentKind::Formulas);
        assert_eq!(DemandRole::MonteCarloCode.content_kind(), ContentKind::Code);
        assert_eq!(DemandRole::AiCode.content_kind(), ContentKind::Code);
        assert_eq!(DemandRole::Dataset.content_kind(), ContentKind::Text);
    }

    #[test]
    fn category_folder_roundtrip() {
        for category in Category::ALL {
            assert_eq!(Category::from_folder_name(category.folder_name()), Some(category));
        }
        assert_eq!(Category::from_folder_name("misc"), None);
    }

    #[test]
    fn corpus_always_has_four_categories_in_order() {
        let paper = Paper::new(
            "T",
            "t",
            Category::InternetPricing2000s,
            Position { category: 2, paper: 0 },
            full_slots(),
        );
        let corpus = Corpus::new(vec![CategoryPapers {
            category: Category::InternetPricing2000s,
            papers: vec![paper],
        }]);

        let order: Vec<Category> = corpus.categories().iter().map(|c| c.category).collect();
        assert_eq!(order, Category::ALL.to_vec());
        assert_eq!(corpus.paper_count(), 1);
        assert!(corpus.categories()[0].papers.is_empty());
    }

    #[test]
    fn completeness_tracks_absent_slots() {
        let mut slots = full_slots();
        assert!(Paper::new("T", "t", Category::InternetPricing1990s, Position { category: 0, paper: 0 }, slots.clone()).is_complete());

        slots[5] = Slot::Absent {
            reason: Absence::MissingFile,
        };
        let paper = Paper::new("T", "t", Category::InternetPricing1990s, Position { category: 0, paper: 0 }, slots);
        assert!(!paper.is_complete());
        assert!(paper.demand(DemandRole::AiCode).is_none());
        assert_eq!(paper.slots().count(), 8);
    }

    #[test]
    fn positions_order_by_traversal() {
        let a = Position { category: 0, paper: 5 };
        let b = Position { category: 1, paper: 0 };
        assert!(a < b);
    }
}
