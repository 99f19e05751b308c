//! Log record model shared by discovery, aggregation and ingestion

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;

/// Open-ended attribute bag carried by a record
pub type AttributeMap = BTreeMap<String, AttributeValue>;

/// A single value inside the attribute bag
///
/// Deserialized untagged from JSON, so `null`, booleans, numbers, strings,
/// arrays and objects map onto the matching variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<AttributeValue>),
    Object(AttributeMap),
}

impl AttributeValue {
    /// Render a leaf value as a dimension key
    ///
    /// Only non-empty strings, numbers and booleans produce a value.
    pub fn as_dimension_value(&self) -> Option<String> {
        match self {
            AttributeValue::String(s) if !s.is_empty() => Some(s.clone()),
            AttributeValue::Number(n) => Some(format_number(*n)),
            AttributeValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

/// Shortest decimal form that round-trips (`42.0` renders as `42`)
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogAttributes {
    pub status: Option<String>,
    pub host: Option<String>,
    pub service: Option<String>,
    pub message: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub attributes: Option<AttributeMap>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogRecord {
    pub id: Option<String>,
    pub attributes: Option<LogAttributes>,
}

impl LogRecord {
    /// Parse a record from a JSONL line
    pub fn from_jsonl(line: &str) -> Result<Self, Box<dyn Error>> {
        let record: LogRecord = serde_json::from_str(line)?;
        Ok(record)
    }

    pub fn id_or_placeholder(&self) -> &str {
        self.id.as_deref().unwrap_or("<nil>")
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.attributes.as_ref().and_then(|a| a.timestamp)
    }

    /// Non-empty message, if any
    pub fn message(&self) -> Option<&str> {
        self.attributes
            .as_ref()
            .and_then(|a| a.message.as_deref())
            .filter(|m| !m.is_empty())
    }
}

impl LogAttributes {
    /// Resolve the value a record contributes to a named dimension
    ///
    /// `status`, `host` and `service` read the well-known attributes (status is
    /// lower-cased); every other name is a dotted path into the attribute bag.
    pub fn field_value(&self, name: &str) -> Option<String> {
        match name {
            "status" => self.status.as_ref().map(|s| s.to_lowercase()),
            "host" => self.host.clone(),
            "service" => self.service.clone(),
            _ => self
                .attributes
                .as_ref()
                .and_then(|bag| lookup_path(bag, name))
                .and_then(AttributeValue::as_dimension_value),
        }
    }
}

/// Walk a dotted path (`a.b.c`) through nested objects
pub fn lookup_path<'a>(bag: &'a AttributeMap, key: &str) -> Option<&'a AttributeValue> {
    let (head, rest) = match key.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (key, None),
    };

    let value = bag.get(head)?;
    match rest {
        None => Some(value),
        Some(rest) => match value {
            AttributeValue::Object(inner) => lookup_path(inner, rest),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record_jsonl() {
        let line = serde_json::json!({
            "id": "AQAAAY",
            "attributes": {
                "status": "ERROR",
                "host": "web-01",
                "service": "api",
                "message": "connection timeout",
                "timestamp": "2024-01-15T10:30:00Z",
                "attributes": {
                    "env": "prod",
                    "http": { "status_code": 503, "retry": true },
                    "tags": ["a", "b"],
                    "trace": null
                }
            }
        })
        .to_string();

        let record = LogRecord::from_jsonl(&line).unwrap();
        let attrs = record.attributes.as_ref().unwrap();

        assert_eq!(record.id_or_placeholder(), "AQAAAY");
        assert_eq!(attrs.status.as_deref(), Some("ERROR"));
        assert_eq!(record.message(), Some("connection timeout"));
        assert!(record.timestamp().is_some());

        let bag = attrs.attributes.as_ref().unwrap();
        assert_eq!(bag.get("trace"), Some(&AttributeValue::Null));
        assert!(matches!(bag.get("tags"), Some(AttributeValue::Array(_))));
        assert!(matches!(bag.get("http"), Some(AttributeValue::Object(_))));
    }

    #[test]
    fn test_field_value_lookup() {
        let line = serde_json::json!({
            "attributes": {
                "status": "ERROR",
                "attributes": {
                    "env": "prod",
                    "http": { "status_code": 503, "retry": true },
                    "empty": ""
                }
            }
        })
        .to_string();
        let record = LogRecord::from_jsonl(&line).unwrap();
        let attrs = record.attributes.unwrap();

        assert_eq!(attrs.field_value("status"), Some("error".to_string()));
        assert_eq!(attrs.field_value("env"), Some("prod".to_string()));
        assert_eq!(attrs.field_value("http.status_code"), Some("503".to_string()));
        assert_eq!(attrs.field_value("http.retry"), Some("true".to_string()));
        assert_eq!(attrs.field_value("http"), None);
        assert_eq!(attrs.field_value("empty"), None);
        assert_eq!(attrs.field_value("host"), None);
        assert_eq!(attrs.field_value("missing.path"), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(-3.25), "-3.25");
    }

    #[test]
    fn test_malformed_jsonl() {
        assert!(LogRecord::from_jsonl(r#"{"attributes": "#).is_err());
    }
}
