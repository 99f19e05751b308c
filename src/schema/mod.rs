//! Inferred shape of a log stream
//!
//! A [`Schema`] lists every field seen in a sample of records together with its
//! type, cardinality and a handful of example values. Aggregation treats each
//! field as a dimension.

pub mod cache;
pub mod discovery;

use serde::{Deserialize, Serialize};

pub use cache::SchemaCache;
pub use discovery::{discover, discover_from};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Bool,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub cardinality: usize,
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Field {
        Field {
            name: name.to_string(),
            field_type: FieldType::String,
            cardinality: 0,
            examples: Vec::new(),
        }
    }

    #[test]
    fn test_field_names_keep_order() {
        let schema = Schema {
            fields: vec![named("a"), named("b"), named("c")],
        };
        assert_eq!(schema.field_names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_has_field() {
        let schema = Schema {
            fields: vec![named("status"), named("host")],
        };
        assert!(schema.has_field("status"));
        assert!(!schema.has_field("missing"));
        assert!(schema.field("host").is_some());
    }

    #[test]
    fn test_field_type_serializes_lowercase() {
        let json = serde_json::to_string(&named("env")).unwrap();
        assert!(json.contains(r#""type":"string""#));
    }
}
