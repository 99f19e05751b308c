//! Schema discovery over a sample of records

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{Field, FieldType, Schema};
use crate::aggregator_core::record::{format_number, AttributeMap, AttributeValue, LogRecord};

pub const MAX_EXAMPLES: usize = 5;
pub const MAX_SAMPLE_SIZE: usize = 200;

/// Accumulates distinct values and the inferred type per field name
#[derive(Default)]
struct FieldTracker {
    values: BTreeMap<String, BTreeSet<String>>,
    types: HashMap<String, FieldType>,
}

impl FieldTracker {
    /// Record a value; a field first seen here is typed as string
    fn track(&mut self, name: &str, value: String) {
        if !self.values.contains_key(name) {
            self.types
                .entry(name.to_string())
                .or_insert(FieldType::String);
        }
        self.values.entry(name.to_string()).or_default().insert(value);
    }

    fn pin_type(&mut self, name: &str, field_type: FieldType) {
        self.types.insert(name.to_string(), field_type);
    }

    fn walk(&mut self, prefix: &str, bag: &AttributeMap) {
        for (key, value) in bag {
            let full_key = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };

            match value {
                AttributeValue::Object(inner) => self.walk(&full_key, inner),
                AttributeValue::Array(_) | AttributeValue::Null => {}
                AttributeValue::String(s) => self.track(&full_key, s.clone()),
                AttributeValue::Number(n) => {
                    self.track(&full_key, format_number(*n));
                    self.pin_type(&full_key, FieldType::Number);
                }
                AttributeValue::Bool(b) => {
                    self.track(&full_key, b.to_string());
                    self.pin_type(&full_key, FieldType::Bool);
                }
            }
        }
    }

    fn into_schema(self) -> Schema {
        let FieldTracker { values, types } = self;
        // BTreeMap iteration yields fields sorted by name, examples sorted by value
        let fields = values
            .into_iter()
            .map(|(name, seen)| Field {
                field_type: types.get(&name).copied().unwrap_or(FieldType::Unknown),
                cardinality: seen.len(),
                examples: seen.into_iter().take(MAX_EXAMPLES).collect(),
                name,
            })
            .collect();
        Schema { fields }
    }
}

/// Infer a schema from the first [`MAX_SAMPLE_SIZE`] records
pub fn discover(records: &[LogRecord]) -> Schema {
    discover_from(records)
}

/// Iterator form of [`discover`]; stops pulling after [`MAX_SAMPLE_SIZE`] records
pub fn discover_from<'a, I>(records: I) -> Schema
where
    I: IntoIterator<Item = &'a LogRecord>,
{
    let mut tracker = FieldTracker::default();
    let mut sampled = 0usize;

    for record in records.into_iter().take(MAX_SAMPLE_SIZE) {
        sampled += 1;
        let attrs = match &record.attributes {
            Some(attrs) => attrs,
            None => continue,
        };

        if let Some(status) = &attrs.status {
            tracker.track("status", status.to_lowercase());
        }
        if let Some(host) = &attrs.host {
            tracker.track("host", host.clone());
        }
        if let Some(service) = &attrs.service {
            tracker.track("service", service.clone());
        }
        if let Some(bag) = &attrs.attributes {
            tracker.walk("", bag);
        }
    }

    let schema = tracker.into_schema();
    log::debug!("🔍 Discovered {} fields from {} sampled records", schema.fields.len(), sampled);
    schema
}
