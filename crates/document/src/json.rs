//! JSON output: the IR as nested objects, built section by section.

use serde_json::{Map, Value, json};

use crate::ir::{Block, DocumentIr, Section};
use crate::serialize::{SerializeError, Serializer};
use crate::visit::{Visitor, walk};

pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn format(&self) -> &str {
        "json"
    }

    fn extension(&self) -> &str {
        "json"
    }

    fn serialize(&self, doc: &DocumentIr) -> Result<String, SerializeError> {
        let mut builder = JsonBuilder::default();
        walk(doc, &mut builder)?;
        let root = builder.root.ok_or(SerializeError::Unbalanced)?;
        Ok(serde_json::to_string_pretty(&root)?)
    }
}

#[derive(Default)]
struct JsonBuilder {
    /// Open sections, innermost last.
    stack: Vec<Map<String, Value>>,
    top: Vec<Value>,
    root: Option<Value>,
}

impl Visitor for JsonBuilder {
    fn enter_section(&mut self, section: &Section) -> Result<(), SerializeError> {
        let mut object = Map::new();
        object.insert("level".into(), json!(section.level));
        object.insert("title".into(), json!(section.title));
        object.insert("kind".into(), serde_json::to_value(&section.kind)?);
        if let Some(marker) = &section.marker {
            object.insert("marker".into(), json!(marker));
        }
        object.insert("content".into(), Value::Array(Vec::new()));
        object.insert("children".into(), Value::Array(Vec::new()));
        self.stack.push(object);
        Ok(())
    }

    fn leave_section(&mut self, _section: &Section) -> Result<(), SerializeError> {
        let finished = Value::Object(self.stack.pop().ok_or(SerializeError::Unbalanced)?);
        match self.stack.last_mut() {
            Some(parent) => push_into(parent, "children", finished),
            None => self.top.push(finished),
        }
        Ok(())
    }

    fn block(&mut self, block: &Block) -> Result<(), SerializeError> {
        let value = serde_json::to_value(block)?;
        let current = self.stack.last_mut().ok_or(SerializeError::Unbalanced)?;
        push_into(current, "content", value);
        Ok(())
    }

    fn end_document(&mut self, doc: &DocumentIr) -> Result<(), SerializeError> {
        if !self.stack.is_empty() {
            return Err(SerializeError::Unbalanced);
        }
        self.root = Some(json!({
            "title": doc.title,
            "sections": std::mem::take(&mut self.top),
        }));
        Ok(())
    }
}

fn push_into(object: &mut Map<String, Value>, field: &str, value: Value) {
    if let Some(Value::Array(items)) = object.get_mut(field) {
        items.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_document;

    #[test]
    fn nests_like_the_ir() {
        let text = JsonSerializer.serialize(&sample_document()).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["title"], "Internet Pricing Models");
        let sections = value["sections"].as_array().unwrap();
        assert_eq!(sections.len(), 8);
        assert_eq!(sections[0]["kind"]["kind"], "introduction");

        let paper = &sections[1]["children"][0];
        assert_eq!(paper["marker"], "[1]");
        assert_eq!(paper["kind"]["citation_key"], "pricingnd");
        assert_eq!(paper["children"].as_array().unwrap().len(), 8);
        assert_eq!(paper["children"][1]["content"][0]["block"], "equation");
    }

    #[test]
    fn bibliography_entries_in_order() {
        let text = JsonSerializer.serialize(&sample_document()).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        let refs = value["sections"][7]["content"].as_array().unwrap();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0]["entry"]["sequence"], 1);
        assert_eq!(refs[0]["entry"]["status"]["status"], "unresolved");
    }
}
