//! # Dossier Core
//!
//! Domain types, traits, and error definitions for the Dossier document
//! assembly compiler. This crate has **no framework dependencies** beyond
//! serde and the async primitives. It defines the model that every other
//! crate builds against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here (`Provider` for the generation
//! service, `ReferenceService` for bibliographic lookups). Implementations
//! live in `dossier-providers`; tests substitute scripted doubles.
//!
//! The corpus shape is closed: four `Category` values and eight
//! `DemandRole` values, both enums, so completeness is a type property.

pub mod citation;
pub mod corpus;
pub mod diagnostics;
pub mod equation;
pub mod error;
pub mod listing;
pub mod message;
pub mod narrative;
pub mod provider;
pub mod reference;
pub mod retry;

// Re-export key types at crate root for ergonomics
pub use citation::{CitationEntry, CitationStatus};
pub use corpus::{
    Absence, Category, CategoryPapers, ContentKind, Corpus, Demand, DemandRole, Paper, PaperRef,
    Position, Slot,
};
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticLog};
pub use equation::{BigOpKind, BinOp, Delimiter, Equation, EquationNode, Fallback, Symbol};
pub use error::{LookupError, ProviderError};
pub use listing::{CodeBlock, CodeOrigin, Segment};
pub use message::{Message, Role};
pub use narrative::{Narrative, NarrativeSection};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use reference::{Author, ReferenceRecord, ReferenceService};
pub use retry::{RetryFailure, RetryPolicy, Retryable, with_retry};
