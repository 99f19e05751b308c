//! Interval-bucketed aggregation over a historical window

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use super::record::LogRecord;
use super::severity::{should_skip, SeverityLevel};
use crate::schema::Schema;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntervalData {
    /// Raw message occurrences in this interval
    pub messages: BTreeMap<String, u64>,
    /// Dimension value occurrences in this interval
    pub values: BTreeMap<String, u64>,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDimensionData {
    /// Index 0 is the earliest interval
    pub intervals: Vec<IntervalData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalAggregates {
    pub dimensions: BTreeMap<String, HistoricalDimensionData>,
}

impl HistoricalAggregates {
    fn empty(schema: &Schema) -> Self {
        let dimensions = schema
            .fields
            .iter()
            .map(|f| (f.name.clone(), HistoricalDimensionData::default()))
            .collect();
        Self { dimensions }
    }

    pub fn dimension(&self, name: &str) -> Option<&HistoricalDimensionData> {
        self.dimensions.get(name)
    }
}

/// Nanoseconds between `earliest` and `ts`, if representable
fn offset_nanos(earliest: DateTime<Utc>, ts: DateTime<Utc>) -> Option<i64> {
    (ts - earliest).num_nanoseconds()
}

/// Bucket records into fixed-width intervals per schema field
///
/// Intervals start at the earliest timestamp in `records` (before severity
/// filtering) and run up to and including the interval holding the latest one.
pub fn aggregate_historical(
    records: &[LogRecord],
    schema: &Schema,
    interval_width: Duration,
    severity: SeverityLevel,
) -> HistoricalAggregates {
    let mut result = HistoricalAggregates::empty(schema);

    let width_nanos = i64::try_from(interval_width.as_nanos()).unwrap_or(i64::MAX);
    if records.is_empty() || width_nanos == 0 {
        return result;
    }

    let mut timestamps = records.iter().filter_map(LogRecord::timestamp);
    let first = match timestamps.next() {
        Some(ts) => ts,
        None => return result,
    };
    let (earliest, latest) =
        timestamps.fold((first, first), |(lo, hi), ts| (lo.min(ts), hi.max(ts)));

    let span = match offset_nanos(earliest, latest) {
        Some(span) => span,
        None => {
            log::warn!("⚠️  Historical span {} → {} is too large to bucket", earliest, latest);
            return result;
        }
    };
    let interval_count = (span / width_nanos) as usize + 1;

    for dim in result.dimensions.values_mut() {
        dim.intervals = vec![IntervalData::default(); interval_count];
    }

    for record in records {
        let attrs = match &record.attributes {
            Some(attrs) => attrs,
            None => continue,
        };
        let ts = match attrs.timestamp {
            Some(ts) => ts,
            None => {
                log::debug!("Skipping log {} without timestamp", record.id_or_placeholder());
                continue;
            }
        };
        if let Some(status) = &attrs.status {
            if should_skip(status, severity) {
                log::debug!(
                    "Skipping log {} with non-matching status {}",
                    record.id_or_placeholder(),
                    status
                );
                continue;
            }
        }

        let idx = match offset_nanos(earliest, ts) {
            Some(offset) if offset >= 0 => (offset / width_nanos) as usize,
            _ => continue,
        };
        if idx >= interval_count {
            continue;
        }

        let message = record.message();
        for field in &schema.fields {
            let value = match attrs.field_value(&field.name) {
                Some(value) => value,
                None => continue,
            };
            let interval = match result.dimensions.get_mut(&field.name) {
                Some(dim) => &mut dim.intervals[idx],
                None => continue,
            };
            interval.count += 1;
            *interval.values.entry(value).or_insert(0) += 1;
            if let Some(message) = message {
                *interval.messages.entry(message.to_string()).or_insert(0) += 1;
            }
        }
    }

    log::debug!(
        "🕰️  Bucketed {} historical records into {} intervals of {:?}",
        records.len(),
        interval_count,
        interval_width
    );

    result
}
