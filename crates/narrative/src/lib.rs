//! # Dossier Narrative
//!
//! Sends the digested corpus to a generation [`Provider`](dossier_core::Provider)
//! and returns the introduction, discussion and conclusion, each checked
//! against its paragraph contract. Any block that cannot be produced within
//! the retry budget fails the run.

pub mod contract;
pub mod prompts;
pub mod synthesizer;

pub use contract::{check_section, split_paragraphs};
pub use synthesizer::{NarrativeSynthesizer, SynthesisError, SynthesisFailure, SynthesisSettings};
