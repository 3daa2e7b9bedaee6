//! Per-paper content processing: formulas parsed, code extracted, the rest
//! carried verbatim.

use dossier_core::{ContentKind, DemandRole, Diagnostic, DiagnosticKind, DiagnosticLog, Paper, Slot};
use dossier_document::{RenderedPaper, SlotContent};
use dossier_formula::parse_formulas;
use dossier_listing::extract;
use tracing::debug;

/// Turn a loaded paper into builder input. Degradations are recorded in
/// the returned log; nothing here fails.
pub fn render_paper(paper: &Paper) -> (RenderedPaper, DiagnosticLog) {
    let mut diagnostics = DiagnosticLog::new();

    let slots = std::array::from_fn(|i| {
        let role = DemandRole::ALL[i];
        let demand = match paper.slot(role) {
            Slot::Present { demand } => demand,
            Slot::Absent { reason } => return SlotContent::Absent(*reason),
        };
        let body = demand.body();
        let degraded = |message: String| {
            Diagnostic::new(DiagnosticKind::ParseDegraded, message)
                .for_paper(paper.reference())
                .for_role(role)
        };

        match role.content_kind() {
            ContentKind::Text => SlotContent::Text(body.to_string()),
            ContentKind::Formulas => {
                let equations = parse_formulas(body);
                if equations.is_empty() {
                    diagnostics.record(degraded(
                        "no formula statements found; body kept as text".into(),
                    ));
                    return SlotContent::Text(body.to_string());
                }
                let fallbacks: Vec<_> =
                    equations.iter().filter_map(|e| e.fallback.as_ref()).collect();
                if let Some(first) = fallbacks.first() {
                    diagnostics.record(degraded(format!(
                        "{} of {} formula statements kept verbatim (first: {first})",
                        fallbacks.len(),
                        equations.len()
                    )));
                }
                SlotContent::Formulas(equations)
            }
            ContentKind::Code => {
                let extraction = extract(body);
                if extraction.unterminated_fence {
                    diagnostics.record(degraded(
                        "code fence never closed; listing runs to the end of the fragment".into(),
                    ));
                }
                if extraction.code_blocks().next().is_none() {
                    diagnostics.record(degraded("no code detected; body kept as prose".into()));
                }
                SlotContent::Listing(extraction.segments)
            }
        }
    });

    debug!(paper = %paper.title, degraded = diagnostics.len(), "Paper rendered");

    (
        RenderedPaper {
            title: paper.title.clone(),
            category: paper.category,
            position: paper.position,
            slots,
        },
        diagnostics,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use dossier_core::{Absence, Category, Demand, Position};

    fn paper(bodies: [Option<&str>; 8]) -> Paper {
        let slots = std::array::from_fn(|i| match bodies[i] {
            Some(body) => Slot::Present {
                demand: Demand::new(DemandRole::ALL[i], body),
            },
            None => Slot::Absent {
                reason: Absence::MissingFile,
            },
        });
        Paper::new(
            "Pricing the Internet",
            "pricing",
            Category::InternetPricing1990s,
            Position {
                category: 0,
                paper: 0,
            },
            slots,
        )
    }

    #[test]
    fn roles_are_routed_by_content_kind() {
        let (rendered, diagnostics) = render_paper(&paper([
            Some("A smart market."),
            Some("E = \\frac{1}{2}mv^2\n\nU = a*x - p"),
            Some("1. Draw demand."),
            Some("```python\nimport numpy as np\n```"),
            None,
            Some("def fit(x):\n    return model.fit(x)"),
            Some("Kaggle: internet prices"),
            Some("Prices fall."),
        ]));

        assert!(matches!(&rendered.slots[0], SlotContent::Text(t) if t == "A smart market."));
        assert!(matches!(&rendered.slots[1], SlotContent::Formulas(eqs) if eqs.len() == 2));
        assert!(matches!(&rendered.slots[3], SlotContent::Listing(_)));
        assert_eq!(rendered.slots[4], SlotContent::Absent(Absence::MissingFile));
        assert!(matches!(
            &rendered.slots[5],
            SlotContent::Listing(segs) if segs.iter().any(|s| s.as_code().is_some())
        ));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn degraded_formulas_yield_one_diagnostic() {
        let (_, diagnostics) = render_paper(&paper([
            Some("x"),
            Some("total cost of the network\n\nprice (a + b\n\nE = mc^2"),
            Some("x"),
            Some("```\nx = 1\n```"),
            Some("x"),
            Some("```\ny = 2\n```"),
            Some("x"),
            Some("x"),
        ]));
        assert_eq!(diagnostics.count(DiagnosticKind::ParseDegraded), 1);
        let d = diagnostics.iter().next().unwrap();
        assert_eq!(d.role, Some(DemandRole::Formulas));
        assert!(d.message.starts_with("2 of 3"));
    }

    #[test]
    fn prose_only_code_slot_is_degraded() {
        let (_, diagnostics) = render_paper(&paper([
            Some("x"),
            Some("a = b"),
            Some("x"),
            Some("The simulation draws random demand and averages the revenue."),
            Some("x"),
            Some("```\nz = 3"),
            Some("x"),
            Some("x"),
        ]));
        let messages: Vec<_> = diagnostics.iter().map(|d| (d.role, d.message.as_str())).collect();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].0, Some(DemandRole::MonteCarloCode));
        assert!(messages[0].1.contains("no code detected"));
        assert_eq!(messages[1].0, Some(DemandRole::AiCode));
        assert!(messages[1].1.contains("never closed"));
    }
}
