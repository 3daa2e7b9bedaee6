//! The serializer adapter interface and format lookup.

use thiserror::Error;

use crate::html::HtmlSerializer;
use crate::ir::DocumentIr;
use crate::json::JsonSerializer;
use crate::markdown::MarkdownSerializer;

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("Unsupported output format '{0}' (expected markdown, html or json)")]
    UnsupportedFormat(String),

    #[error("Formatting failed: {0}")]
    Fmt(#[from] std::fmt::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Highlight(#[from] dossier_listing::HighlightError),

    #[error("Visitor left unbalanced sections")]
    Unbalanced,
}

/// Turns a finished IR into one output format.
pub trait Serializer: Send + Sync {
    /// Short format name, e.g. `markdown`.
    fn format(&self) -> &str;

    /// File extension for this format, without the dot.
    fn extension(&self) -> &str;

    fn serialize(&self, doc: &DocumentIr) -> Result<String, SerializeError>;
}

/// Look up a serializer by format name or extension.
pub fn serializer_for(format: &str) -> Result<Box<dyn Serializer>, SerializeError> {
    match format.to_ascii_lowercase().as_str() {
        "markdown" | "md" => Ok(Box::new(MarkdownSerializer)),
        "html" | "htm" => Ok(Box::new(HtmlSerializer)),
        "json" => Ok(Box::new(JsonSerializer)),
        other => Err(SerializeError::UnsupportedFormat(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name_and_extension() {
        assert_eq!(serializer_for("markdown").unwrap().format(), "markdown");
        assert_eq!(serializer_for("MD").unwrap().extension(), "md");
        assert_eq!(serializer_for("html").unwrap().format(), "html");
        assert_eq!(serializer_for("json").unwrap().extension(), "json");
        assert!(matches!(
            serializer_for("docx"),
            Err(SerializeError::UnsupportedFormat(f)) if f == "docx"
        ));
    }
}
