//! Run orchestration for Dossier.
//!
//! A run loads the corpus with a bounded worker pool, then processes papers
//! (formula parsing, code extraction, citation resolution) while the
//! narrative sections are generated. The document is built only once both
//! sides have finished; any fatal failure means no document at all.

pub mod render;
pub mod report;
pub mod run;

pub use render::render_paper;
pub use report::{RunReport, Tally};
pub use run::{Inspection, Pipeline, PipelineSettings, RunFailure, RunOutcome, inspect};
