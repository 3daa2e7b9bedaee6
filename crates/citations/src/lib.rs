//! # Dossier Citations
//!
//! Resolves paper titles to bibliographic records through a
//! [`ReferenceService`](dossier_core::ReferenceService), at most one lookup
//! per normalized title per run, and assembles the numbered bibliography.

mod bibliography;
mod normalize;
mod resolver;

pub use bibliography::Bibliography;
pub use normalize::normalize_title;
pub use resolver::{CitationResolver, Resolution};
