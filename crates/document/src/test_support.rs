//! Fixtures shared by the builder and serializer tests.

use dossier_citations::{Bibliography, normalize_title};
use dossier_core::{Absence, Category, CitationStatus, DemandRole, Narrative, Position};
use dossier_formula::parse_formulas;
use dossier_listing::extract;

use crate::builder::{DocumentBuilder, RenderedPaper, SlotContent};
use crate::ir::DocumentIr;

pub fn narrative() -> Narrative {
    let paras = |prefix: &str, n: usize| -> Vec<String> {
        (1..=n).map(|i| format!("{prefix} paragraph {i}.")).collect()
    };
    Narrative {
        introduction: paras("Intro", 5),
        discussion: paras("Discussion", 2),
        conclusion: paras("Conclusion", 3),
    }
}

pub fn bibliography_for(titles: &[&str]) -> Bibliography {
    Bibliography::from_ordered(
        titles
            .iter()
            .map(|t| {
                (
                    normalize_title(t),
                    t.to_string(),
                    CitationStatus::Unresolved {
                        reason: "not found".into(),
                    },
                )
            })
            .collect(),
    )
}

pub fn rendered_paper(
    title: &str,
    category: Category,
    category_index: usize,
    paper_index: usize,
) -> RenderedPaper {
    let slots = std::array::from_fn(|i| match DemandRole::ALL[i] {
        DemandRole::Formulas => SlotContent::Formulas(parse_formulas("E = \\frac{1}{2}mv^2")),
        role => SlotContent::Text(format!("Body of demand {}.", role.number())),
    });
    RenderedPaper {
        title: title.to_string(),
        category,
        position: Position {
            category: category_index,
            paper: paper_index,
        },
        slots,
    }
}

/// One paper with formulas, a Python listing and a missing AI-code slot.
pub fn sample_document() -> DocumentIr {
    let mut paper = rendered_paper("Pricing the Internet", Category::InternetPricing1990s, 0, 0);
    paper.slots[DemandRole::MonteCarloCode.index()] = SlotContent::Listing(
        extract("Run it like this:\n\n```python\nimport numpy as np\nprint(\"done\")\n```\n").segments,
    );
    paper.slots[DemandRole::AiCode.index()] = SlotContent::Absent(Absence::MissingFile);

    DocumentBuilder::new("Internet Pricing Models")
        .build(
            &narrative(),
            vec![paper],
            &bibliography_for(&["Pricing the Internet"]),
        )
        .expect("sample document is well-formed")
}
