//! Per-token highlighting for listings, emitted as class-based HTML spans.
//!
//! Uses syntect's bundled syntax definitions, so any fenced language it
//! knows (`python`, `r`, `matlab`, ...) is highlighted. Unknown languages
//! fall back to plain text. Class names carry the `hl-` prefix so they never
//! collide with the document's own styles.

use std::sync::LazyLock;

use syntect::highlighting::ThemeSet;
use syntect::html::{ClassStyle, ClassedHTMLGenerator, css_for_theme_with_class_style};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use thiserror::Error;
use tracing::debug;

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

/// Theme the stylesheet is generated from.
const THEME: &str = "InspiredGitHub";

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("Highlighting failed: {0}")]
    Syntect(#[from] syntect::Error),

    #[error("Theme '{0}' is not bundled")]
    MissingTheme(String),
}

fn syntax_for(language: &str) -> &'static SyntaxReference {
    let syntaxes = &*SYNTAXES;
    syntaxes.find_syntax_by_token(language).unwrap_or_else(|| {
        debug!(language, "No syntax definition, highlighting as plain text");
        syntaxes.find_syntax_plain_text()
    })
}

/// Highlight `code` as `language`. The result is escaped HTML; stripping
/// the tags and unescaping gives back `code` exactly.
pub fn highlight_html(code: &str, language: &str) -> Result<String, HighlightError> {
    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax_for(language), &SYNTAXES, CLASS_STYLE);
    for line in LinesWithEndings::from(code) {
        generator.parse_html_for_line_which_includes_newline(line)?;
    }
    Ok(generator.finalize())
}

/// CSS rules for the classes [`highlight_html`] emits.
pub fn stylesheet() -> Result<String, HighlightError> {
    let themes = ThemeSet::load_defaults();
    let theme = themes
        .themes
        .get(THEME)
        .ok_or_else(|| HighlightError::MissingTheme(THEME.to_string()))?;
    Ok(css_for_theme_with_class_style(theme, CLASS_STYLE)?)
}
