//! Markdown output: ATX headings, `$$` LaTeX math, fenced code.

use std::fmt::Write;

use dossier_core::{CodeBlock, Equation, EquationNode, Fallback};
use dossier_formula::to_latex;

use crate::ir::{Block, DocumentIr, Section};
use crate::serialize::{SerializeError, Serializer};
use crate::visit::{Visitor, walk};

pub struct MarkdownSerializer;

impl Serializer for MarkdownSerializer {
    fn format(&self) -> &str {
        "markdown"
    }

    fn extension(&self) -> &str {
        "md"
    }

    fn serialize(&self, doc: &DocumentIr) -> Result<String, SerializeError> {
        let mut writer = MarkdownWriter::default();
        walk(doc, &mut writer)?;
        Ok(writer.out)
    }
}

#[derive(Default)]
struct MarkdownWriter {
    out: String,
}

impl Visitor for MarkdownWriter {
    fn start_document(&mut self, doc: &DocumentIr) -> Result<(), SerializeError> {
        writeln!(self.out, "---")?;
        writeln!(self.out, "title: \"{}\"", doc.title.replace('"', "\\\""))?;
        writeln!(self.out, "---\n")?;
        Ok(())
    }

    fn enter_section(&mut self, section: &Section) -> Result<(), SerializeError> {
        let hashes = "#".repeat(usize::from(section.level.max(1)));
        writeln!(self.out, "{hashes} {}\n", section.heading())?;
        Ok(())
    }

    fn block(&mut self, block: &Block) -> Result<(), SerializeError> {
        match block {
            Block::Paragraph { text } => writeln!(self.out, "{text}\n")?,
            Block::Equation { equation } => self.equation(equation)?,
            Block::Code { code } => self.code(code)?,
            Block::Placeholder { reason, .. } => {
                writeln!(self.out, "*[Content unavailable: {reason}.]*\n")?
            }
            Block::Reference { entry } => {
                writeln!(self.out, "{} {}\n", entry.marker(), entry.citation_text())?
            }
        }
        Ok(())
    }
}

impl MarkdownWriter {
    fn equation(&mut self, equation: &Equation) -> Result<(), SerializeError> {
        if let Some(label) = &equation.label {
            writeln!(self.out, "**{label}:**\n")?;
        }

        let verbatim = matches!(equation.fallback, Some(Fallback::NoOperator))
            || matches!(&equation.root, EquationNode::Symbol { symbol } if symbol.opaque);
        if verbatim {
            writeln!(self.out, "{}\n", equation.source)?;
        } else {
            writeln!(self.out, "$$")?;
            write!(self.out, "{}", to_latex(&equation.root))?;
            if let Some(number) = &equation.number {
                write!(self.out, " \\tag{{{number}}}")?;
            }
            writeln!(self.out, "\n$$\n")?;
        }

        if let Some(qualifier) = &equation.qualifier {
            writeln!(self.out, "{qualifier}\n")?;
        }
        Ok(())
    }

    fn code(&mut self, code: &CodeBlock) -> Result<(), SerializeError> {
        let text = code.text();
        let fence = if text.contains("```") { "~~~~" } else { "```" };
        writeln!(self.out, "{fence}{}", code.language)?;
        writeln!(self.out, "{text}")?;
        writeln!(self.out, "{fence}\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_document;

    #[test]
    fn headings_keep_levels_and_markers() {
        let md = MarkdownSerializer.serialize(&sample_document()).unwrap();
        assert!(md.starts_with("---\ntitle: \"Internet Pricing Models\"\n---"));
        assert!(md.contains("\n# Introduction\n"));
        assert!(md.contains("\n## Pricing the Internet [1]\n"));
        assert!(md.contains("\n### b) Mathematical formulas\n"));
        assert!(md.contains("\n# Bibliography\n"));
    }

    #[test]
    fn math_and_code_render_natively() {
        let md = MarkdownSerializer.serialize(&sample_document()).unwrap();
        assert!(md.contains("$$\nE = \\frac{1}{2} m v^{2}\n$$"));
        assert!(md.contains("```python\nimport numpy as np\n"));
    }

    #[test]
    fn placeholder_and_bibliography() {
        let md = MarkdownSerializer.serialize(&sample_document()).unwrap();
        assert!(md.contains("*[Content unavailable: fragment file missing.]*"));
        assert!(md.contains("[1] Pricing the Internet (metadata not found)."));
    }

    #[test]
    fn sections_appear_in_document_order() {
        let md = MarkdownSerializer.serialize(&sample_document()).unwrap();
        let at = |s: &str| md.find(s).unwrap();
        assert!(at("# Introduction") < at("# internet pricing (from 1990 to 2000)"));
        assert!(at("## Pricing the Internet") < at("# Discussion"));
        assert!(at("# Discussion") < at("# Conclusion"));
        assert!(at("# Conclusion") < at("# Bibliography"));
    }
}
