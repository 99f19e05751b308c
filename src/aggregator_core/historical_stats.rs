//! Interval-series statistics and historical-to-aggregate conversion

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::dimensions::{Aggregates, DimensionData};
use super::historical::HistoricalAggregates;
use super::stats::{
    average_f64, calculate_median, calculate_std_dev, max_f64, min_f64, Comparison, TOP_N,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageCount {
    pub message: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalInsights {
    pub total_count: u64,
    pub average_count: f64,
    pub median_count: f64,
    pub standard_deviation: f64,
    pub top_messages: Vec<MessageCount>,
    /// Per-interval counts, earliest first
    pub interval_counts: Vec<u64>,
}

pub fn extract_historical_insights(
    historical: &HistoricalAggregates,
    dimension: &str,
) -> HistoricalInsights {
    let dim = match historical.dimension(dimension) {
        Some(dim) if !dim.intervals.is_empty() => dim,
        _ => return HistoricalInsights::default(),
    };

    let interval_counts: Vec<u64> = dim.intervals.iter().map(|i| i.count).collect();
    let total_count: u64 = interval_counts.iter().sum();
    let average_count = total_count as f64 / interval_counts.len() as f64;

    let mut all_messages: BTreeMap<&str, u64> = BTreeMap::new();
    for interval in &dim.intervals {
        for (message, count) in &interval.messages {
            *all_messages.entry(message.as_str()).or_insert(0) += count;
        }
    }
    let mut top_messages: Vec<MessageCount> = all_messages
        .into_iter()
        .map(|(message, count)| MessageCount {
            message: message.to_string(),
            count,
        })
        .collect();
    top_messages.sort_by(|a, b| b.count.cmp(&a.count));
    top_messages.truncate(TOP_N);

    HistoricalInsights {
        total_count,
        average_count,
        median_count: calculate_median(&interval_counts),
        standard_deviation: calculate_std_dev(&interval_counts, average_count),
        top_messages,
        interval_counts,
    }
}

/// Compare an interval series against a baseline series
///
/// Z-scores of `current`'s intervals are only reported when the baseline has
/// a non-zero standard deviation.
pub fn compare_historical_insights(
    current: &HistoricalInsights,
    baseline: &HistoricalInsights,
) -> Comparison {
    let mut comparison = Comparison::new();

    comparison.insert(
        "TotalCountDiff".to_string(),
        current.total_count as f64 - baseline.total_count as f64,
    );
    comparison.insert(
        "AverageCountDiff".to_string(),
        current.average_count - baseline.average_count,
    );
    comparison.insert(
        "MedianCountDiff".to_string(),
        current.median_count - baseline.median_count,
    );
    comparison.insert(
        "StandardDeviationDiff".to_string(),
        current.standard_deviation - baseline.standard_deviation,
    );

    if baseline.standard_deviation != 0.0 {
        let z_scores: Vec<f64> = current
            .interval_counts
            .iter()
            .map(|&c| (c as f64 - baseline.average_count) / baseline.standard_deviation)
            .collect();

        comparison.insert("MaxZScore".to_string(), max_f64(&z_scores));
        comparison.insert("MinZScore".to_string(), min_f64(&z_scores));
        comparison.insert("AverageZScore".to_string(), average_f64(&z_scores));
    }

    comparison
}

/// Collapse interval buckets into plain per-value counts
///
/// Each dimension's value counters are summed across all intervals without
/// weighting; message clusters are left empty.
pub fn historical_to_aggregates(historical: &HistoricalAggregates) -> Aggregates {
    let dimensions = historical
        .dimensions
        .iter()
        .map(|(name, dim)| {
            let mut counts: BTreeMap<String, u64> = BTreeMap::new();
            for interval in &dim.intervals {
                for (value, count) in &interval.values {
                    *counts.entry(value.clone()).or_insert(0) += count;
                }
            }
            (
                name.clone(),
                DimensionData {
                    counts,
                    message_groups: Vec::new(),
                },
            )
        })
        .collect();

    Aggregates { dimensions }
}
