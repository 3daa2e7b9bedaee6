//! # Dossier Listing
//!
//! Finds source code inside the simulation-code and AI-code demand bodies
//! and highlights it per token for the HTML serializer. Code is never
//! executed or type-checked.

pub mod extract;
pub mod highlight;

pub use extract::{DEFAULT_LANGUAGE, Extraction, code_score, extract};
pub use highlight::{HighlightError, highlight_html, stylesheet};
