//! Depth-first traversal shared by every serializer.

use crate::ir::{Block, DocumentIr, Section};
use crate::serialize::SerializeError;

/// Callbacks fired while walking the IR. A section's own blocks are visited
/// before its children.
pub trait Visitor {
    fn start_document(&mut self, _doc: &DocumentIr) -> Result<(), SerializeError> {
        Ok(())
    }

    fn end_document(&mut self, _doc: &DocumentIr) -> Result<(), SerializeError> {
        Ok(())
    }

    fn enter_section(&mut self, section: &Section) -> Result<(), SerializeError>;

    fn leave_section(&mut self, _section: &Section) -> Result<(), SerializeError> {
        Ok(())
    }

    fn block(&mut self, block: &Block) -> Result<(), SerializeError>;
}

pub fn walk(doc: &DocumentIr, visitor: &mut impl Visitor) -> Result<(), SerializeError> {
    visitor.start_document(doc)?;
    for section in &doc.sections {
        walk_section(section, visitor)?;
    }
    visitor.end_document(doc)
}

fn walk_section(section: &Section, visitor: &mut impl Visitor) -> Result<(), SerializeError> {
    visitor.enter_section(section)?;
    for block in &section.content {
        visitor.block(block)?;
    }
    for child in &section.children {
        walk_section(child, visitor)?;
    }
    visitor.leave_section(section)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::SectionKind;

    #[derive(Default)]
    struct Trace(Vec<String>);

    impl Visitor for Trace {
        fn enter_section(&mut self, section: &Section) -> Result<(), SerializeError> {
            self.0.push(format!("enter {}", section.title));
            Ok(())
        }

        fn leave_section(&mut self, section: &Section) -> Result<(), SerializeError> {
            self.0.push(format!("leave {}", section.title));
            Ok(())
        }

        fn block(&mut self, block: &Block) -> Result<(), SerializeError> {
            if let Block::Paragraph { text } = block {
                self.0.push(format!("para {text}"));
            }
            Ok(())
        }
    }

    #[test]
    fn blocks_before_children_depth_first() {
        let mut outer = Section::new(1, "A", SectionKind::Introduction);
        outer.content.push(Block::paragraph("a1"));
        let mut inner = Section::new(2, "B", SectionKind::Discussion);
        inner.content.push(Block::paragraph("b1"));
        outer.children.push(inner);
        let doc = DocumentIr {
            title: "T".into(),
            sections: vec![outer, Section::new(1, "C", SectionKind::Conclusion)],
        };

        let mut trace = Trace::default();
        walk(&doc, &mut trace).unwrap();
        assert_eq!(
            trace.0,
            [
                "enter A", "para a1", "enter B", "para b1", "leave B", "leave A", "enter C",
                "leave C"
            ]
        );
    }
}
