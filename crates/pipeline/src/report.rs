//! Run summary printed at the end of `build` and `inspect`.

use chrono::{DateTime, Utc};
use dossier_core::{DiagnosticKind, DiagnosticLog};
use dossier_document::{RenderedPaper, SlotContent};
use serde::Serialize;
use uuid::Uuid;

/// Content counts over the rendered papers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub papers: usize,
    pub complete_papers: usize,
    pub absent_slots: usize,
    pub equations: usize,
    pub degraded_equations: usize,
    pub code_blocks: usize,
}

impl Tally {
    pub fn of(papers: &[RenderedPaper]) -> Self {
        let mut tally = Tally {
            papers: papers.len(),
            ..Default::default()
        };
        for paper in papers {
            let mut complete = true;
            for slot in &paper.slots {
                match slot {
                    SlotContent::Absent(_) => {
                        tally.absent_slots += 1;
                        complete = false;
                    }
                    SlotContent::Formulas(equations) => {
                        tally.equations += equations.len();
                        tally.degraded_equations +=
                            equations.iter().filter(|e| e.is_degraded()).count();
                    }
                    SlotContent::Listing(segments) => {
                        tally.code_blocks += segments.iter().filter(|s| s.as_code().is_some()).count();
                    }
                    SlotContent::Text(_) => {}
                }
            }
            if complete {
                tally.complete_papers += 1;
            }
        }
        tally
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub tally: Tally,
    pub citations: usize,
    pub unresolved_citations: usize,
    pub missing_inputs: usize,
    pub parse_degradations: usize,
    pub lookup_failures: usize,
}

impl RunReport {
    pub fn new(
        run_id: Uuid,
        started_at: DateTime<Utc>,
        tally: Tally,
        citations: usize,
        unresolved_citations: usize,
        diagnostics: &DiagnosticLog,
    ) -> Self {
        Self {
            run_id,
            started_at,
            finished_at: Utc::now(),
            tally,
            citations,
            unresolved_citations,
            missing_inputs: diagnostics.count(DiagnosticKind::MissingInput),
            parse_degradations: diagnostics.count(DiagnosticKind::ParseDegraded),
            lookup_failures: diagnostics.count(DiagnosticKind::LookupFailure),
        }
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Run {} ({} ms)", self.run_id, self.elapsed_ms())?;
        writeln!(
            f,
            "  Papers:      {} ({} complete, {} absent slots)",
            self.tally.papers, self.tally.complete_papers, self.tally.absent_slots
        )?;
        writeln!(
            f,
            "  Equations:   {} ({} kept verbatim)",
            self.tally.equations, self.tally.degraded_equations
        )?;
        writeln!(f, "  Listings:    {}", self.tally.code_blocks)?;
        writeln!(
            f,
            "  Citations:   {} ({} unresolved)",
            self.citations, self.unresolved_citations
        )?;
        write!(
            f,
            "  Diagnostics: {} missing input, {} parse degraded, {} lookup failure",
            self.missing_inputs, self.parse_degradations, self.lookup_failures
        )
    }
}
