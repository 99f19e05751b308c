//! Summary statistics over aggregates and current-vs-baseline comparison

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::dimensions::Aggregates;

pub const TOP_N: usize = 5;

/// Named numeric differences between two summaries
pub type Comparison = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCount {
    pub key: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub total_count: u64,
    pub unique_keys: usize,
    pub top_keys: Vec<KeyCount>,
    pub average_logs_per_key: f64,
}

pub fn extract_insights(aggregates: &Aggregates, dimension: &str) -> Insights {
    let dim = match aggregates.dimension(dimension) {
        Some(dim) => dim,
        None => return Insights::default(),
    };

    let total_count: u64 = dim.counts.values().sum();
    let unique_keys = dim.counts.len();
    let average_logs_per_key = if unique_keys > 0 {
        total_count as f64 / unique_keys as f64
    } else {
        0.0
    };

    Insights {
        total_count,
        unique_keys,
        top_keys: top_keys(&dim.counts, TOP_N),
        average_logs_per_key,
    }
}

/// Highest counts first; equal counts ordered by key
pub fn top_keys(counts: &BTreeMap<String, u64>, n: usize) -> Vec<KeyCount> {
    let mut keys: Vec<KeyCount> = counts
        .iter()
        .map(|(key, &count)| KeyCount {
            key: key.clone(),
            count,
        })
        .collect();
    // BTreeMap already yields keys ascending, so a stable sort keeps ties ordered
    keys.sort_by(|a, b| b.count.cmp(&a.count));
    keys.truncate(n);
    keys
}

pub fn compare_insights(current: &Insights, historical: &Insights) -> Comparison {
    let mut comparison = Comparison::new();

    comparison.insert(
        "TotalCountDiff".to_string(),
        current.total_count as f64 - historical.total_count as f64,
    );
    comparison.insert(
        "UniqueKeysDiff".to_string(),
        current.unique_keys as f64 - historical.unique_keys as f64,
    );
    comparison.insert(
        "AverageLogsPerKeyDiff".to_string(),
        current.average_logs_per_key - historical.average_logs_per_key,
    );

    comparison.insert(
        "TotalCountPercentChange".to_string(),
        percent_change(historical.total_count as f64, current.total_count as f64),
    );
    comparison.insert(
        "UniqueKeysPercentChange".to_string(),
        percent_change(historical.unique_keys as f64, current.unique_keys as f64),
    );
    comparison.insert(
        "AverageLogsPerKeyPercentChange".to_string(),
        percent_change(historical.average_logs_per_key, current.average_logs_per_key),
    );

    for key_count in &current.top_keys {
        let baseline = historical
            .top_keys
            .iter()
            .find(|k| k.key == key_count.key)
            .map(|k| k.count)
            .unwrap_or(0);

        comparison.insert(
            format!("{}_CountDiff", key_count.key),
            key_count.count as f64 - baseline as f64,
        );
        comparison.insert(
            format!("{}_PercentChange", key_count.key),
            percent_change(baseline as f64, key_count.count as f64),
        );
    }

    comparison
}

/// Relative change in percent; 0 when both are zero, +∞ from a zero baseline
pub fn percent_change(old: f64, new: f64) -> f64 {
    if old == 0.0 {
        if new == 0.0 {
            return 0.0;
        }
        return f64::INFINITY;
    }
    (new - old) / old * 100.0
}

pub fn calculate_median(counts: &[u64]) -> f64 {
    if counts.is_empty() {
        return 0.0;
    }
    let mut sorted = counts.to_vec();
    sorted.sort_unstable();

    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0
    } else {
        sorted[n / 2] as f64
    }
}

/// Population standard deviation around `mean`
pub fn calculate_std_dev(counts: &[u64], mean: f64) -> f64 {
    if counts.is_empty() {
        return 0.0;
    }
    let variance = counts
        .iter()
        .map(|&c| {
            let diff = c as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / counts.len() as f64;
    variance.sqrt()
}

pub fn max_f64(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

pub fn min_f64(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

pub fn average_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
