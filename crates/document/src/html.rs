//! Standalone HTML output with MathML equations and highlighted listings.

use std::fmt::Write;

use dossier_core::{Category, CodeBlock, Equation, EquationNode, Fallback};
use dossier_formula::mathml::escape;
use dossier_formula::to_mathml;
use dossier_listing::{highlight_html, stylesheet};

use crate::ir::{Block, DocumentIr, Section, SectionKind};
use crate::serialize::{SerializeError, Serializer};
use crate::visit::{Visitor, walk};

const STYLE: &str = "\
body { max-width: 52em; margin: 2em auto; font-family: Georgia, serif; line-height: 1.5; }
p { white-space: pre-line; }
.equation { margin: 1em 0; text-align: center; }
.equation .label { display: block; font-weight: bold; text-align: left; }
.equation .number { float: right; }
.equation .qualifier { display: block; font-style: italic; text-align: left; }
figure.listing { display: table; margin: 1.2em auto; padding: 0.6em 1em; background: #f6f8fa; border: 1px solid #d0d7de; border-radius: 4px; }
figure.listing pre { margin: 0; font-size: 0.9em; }
.placeholder { color: #8c8c8c; font-style: italic; }
";

pub struct HtmlSerializer;

impl Serializer for HtmlSerializer {
    fn format(&self) -> &str {
        "html"
    }

    fn extension(&self) -> &str {
        "html"
    }

    fn serialize(&self, doc: &DocumentIr) -> Result<String, SerializeError> {
        let mut writer = HtmlWriter::default();
        walk(doc, &mut writer)?;
        if writer.open != 0 {
            return Err(SerializeError::Unbalanced);
        }
        Ok(writer.out)
    }
}

#[derive(Default)]
struct HtmlWriter {
    out: String,
    /// Currently open `<section>` elements.
    open: usize,
    /// Enclosing category and papers seen in it so far, for anchors.
    category: Option<Category>,
    papers_in_category: usize,
}

impl Visitor for HtmlWriter {
    fn start_document(&mut self, doc: &DocumentIr) -> Result<(), SerializeError> {
        let title = escape(&doc.title);
        writeln!(self.out, "<!DOCTYPE html>")?;
        writeln!(self.out, "<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">")?;
        writeln!(self.out, "<title>{title}</title>")?;
        writeln!(self.out, "<style>\n{STYLE}{}</style>", stylesheet()?)?;
        writeln!(self.out, "</head>\n<body>")?;
        writeln!(self.out, "<header><p class=\"doc-title\">{title}</p></header>")?;
        Ok(())
    }

    fn end_document(&mut self, _doc: &DocumentIr) -> Result<(), SerializeError> {
        writeln!(self.out, "</body>\n</html>")?;
        Ok(())
    }

    fn enter_section(&mut self, section: &Section) -> Result<(), SerializeError> {
        let level = section.level.clamp(1, 6);
        let id = match &section.kind {
            SectionKind::Category { category } => {
                self.category = Some(*category);
                self.papers_in_category = 0;
                format!(" id=\"{}\"", category.folder_name())
            }
            SectionKind::Paper { citation_key, .. } => {
                self.papers_in_category += 1;
                let scope = self.category.map_or("paper", Category::folder_name);
                format!(
                    " id=\"{scope}-{}-{}\"",
                    self.papers_in_category,
                    escape(citation_key)
                )
            }
            SectionKind::Bibliography => " id=\"bibliography\"".to_string(),
            _ => String::new(),
        };
        writeln!(self.out, "<section{id}>")?;
        self.open += 1;

        write!(self.out, "<h{level}>{}", escape(&section.title))?;
        if let Some(marker) = &section.marker {
            write!(self.out, " <span class=\"cite\">{}</span>", escape(marker))?;
        }
        writeln!(self.out, "</h{level}>")?;

        if matches!(section.kind, SectionKind::Bibliography) {
            writeln!(self.out, "<ol class=\"bibliography\">")?;
        }
        Ok(())
    }

    fn leave_section(&mut self, section: &Section) -> Result<(), SerializeError> {
        if matches!(section.kind, SectionKind::Bibliography) {
            writeln!(self.out, "</ol>")?;
        }
        writeln!(self.out, "</section>")?;
        self.open = self.open.checked_sub(1).ok_or(SerializeError::Unbalanced)?;
        Ok(())
    }

    fn block(&mut self, block: &Block) -> Result<(), SerializeError> {
        match block {
            Block::Paragraph { text } => writeln!(self.out, "<p>{}</p>", escape(text))?,
            Block::Equation { equation } => self.equation(equation)?,
            Block::Code { code } => self.code(code)?,
            Block::Placeholder { reason, .. } => writeln!(
                self.out,
                "<p class=\"placeholder\">Content unavailable: {reason}.</p>"
            )?,
            Block::Reference { entry } => writeln!(
                self.out,
                "<li id=\"ref-{}\" value=\"{}\">{} {}</li>",
                entry.sequence,
                entry.sequence,
                escape(&entry.marker()),
                escape(&entry.citation_text())
            )?,
        }
        Ok(())
    }
}

impl HtmlWriter {
    fn equation(&mut self, equation: &Equation) -> Result<(), SerializeError> {
        writeln!(self.out, "<div class=\"equation\">")?;
        if let Some(label) = &equation.label {
            writeln!(self.out, "<span class=\"label\">{}:</span>", escape(label))?;
        }
        if let Some(number) = &equation.number {
            writeln!(self.out, "<span class=\"number\">({})</span>", escape(number))?;
        }

        let verbatim = matches!(equation.fallback, Some(Fallback::NoOperator))
            || matches!(&equation.root, EquationNode::Symbol { symbol } if symbol.opaque);
        if verbatim {
            writeln!(self.out, "<p>{}</p>", escape(&equation.source))?;
        } else {
            writeln!(self.out, "{}", to_mathml(&equation.root))?;
        }

        if let Some(qualifier) = &equation.qualifier {
            writeln!(self.out, "<span class=\"qualifier\">{}</span>", escape(qualifier))?;
        }
        writeln!(self.out, "</div>")?;
        Ok(())
    }

    fn code(&mut self, code: &CodeBlock) -> Result<(), SerializeError> {
        let language = escape(&code.language);
        write!(
            self.out,
            "<figure class=\"listing\"><pre><code class=\"language-{language}\">"
        )?;
        self.out.push_str(&highlight_html(&code.text(), &code.language)?);
        writeln!(self.out, "</code></pre></figure>")?;
        Ok(())
    }
}
