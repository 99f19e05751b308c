//! Per-dimension counting and message clustering for one time window

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::record::LogRecord;
use super::severity::{should_skip, SeverityLevel};
use crate::fuzzy::{self, MessageGroup};
use crate::schema::Schema;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionData {
    /// Occurrences per dimension value
    pub counts: BTreeMap<String, u64>,
    /// Clustered messages, most frequent first
    pub message_groups: Vec<MessageGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregates {
    pub dimensions: BTreeMap<String, DimensionData>,
}

impl Aggregates {
    pub fn dimension(&self, name: &str) -> Option<&DimensionData> {
        self.dimensions.get(name)
    }
}

/// Count dimension values and cluster messages for every field in `schema`
///
/// Every schema field gets an entry, even if no record contributes to it.
pub fn aggregate(records: &[LogRecord], schema: &Schema, severity: SeverityLevel) -> Aggregates {
    let mut dimensions: BTreeMap<String, DimensionData> = BTreeMap::new();
    let mut raw_messages: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for field in &schema.fields {
        dimensions.insert(field.name.clone(), DimensionData::default());
    }

    let mut skipped = 0usize;
    for record in records {
        let attrs = match &record.attributes {
            Some(attrs) => attrs,
            None => continue,
        };

        if let Some(status) = &attrs.status {
            if should_skip(status, severity) {
                log::debug!(
                    "Skipping log {} due to severity filter ({})",
                    record.id_or_placeholder(),
                    status
                );
                skipped += 1;
                continue;
            }
        }

        let message = record.message();
        for field in &schema.fields {
            let value = match attrs.field_value(&field.name) {
                Some(value) => value,
                None => continue,
            };
            if let Some(dim) = dimensions.get_mut(&field.name) {
                *dim.counts.entry(value).or_insert(0) += 1;
                if let Some(message) = message {
                    raw_messages
                        .entry(field.name.clone())
                        .or_default()
                        .push(message.to_string());
                }
            }
        }
    }

    for (name, messages) in raw_messages {
        if let Some(dim) = dimensions.get_mut(&name) {
            dim.message_groups = fuzzy::group(&messages);
        }
    }

    log::debug!(
        "📊 Aggregated {} records into {} dimensions ({} skipped by {} filter)",
        records.len(),
        dimensions.len(),
        skipped,
        severity
    );

    Aggregates { dimensions }
}
