//! # Dossier Document
//!
//! The document IR, the builder that assembles it under its ordering and
//! nesting rules, and the reference serializers (Markdown, HTML, JSON) that
//! walk it depth-first.

pub mod builder;
pub mod html;
pub mod ir;
pub mod json;
pub mod markdown;
pub mod serialize;
pub mod visit;

#[cfg(test)]
mod test_support;

pub use builder::{DocumentBuilder, RenderedPaper, SlotContent, StructuralViolation, validate};
pub use html::HtmlSerializer;
pub use ir::{Block, DocumentIr, Section, SectionKind};
pub use json::JsonSerializer;
pub use markdown::MarkdownSerializer;
pub use serialize::{SerializeError, Serializer, serializer_for};
pub use visit::{Visitor, walk};
