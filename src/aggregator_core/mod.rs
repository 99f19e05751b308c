//! Aggregator Core - Log Aggregation and Comparison Engine
//!
//! Turns a batch of log records into per-dimension summaries and compares a
//! current window against a historical baseline.
//!
//! # Architecture
//!
//! ```text
//! LogRecord batch + Schema
//!     ↓
//! severity filter (ALL / MEDIUM / SEVERE)
//!     ↓
//! aggregate()             → Aggregates (counts + message clusters)
//! aggregate_historical()  → HistoricalAggregates (fixed-width intervals)
//!     ↓
//! extract_insights / extract_historical_insights
//!     ↓
//! compare_insights / compare_historical_insights → Comparison map
//! ```

pub mod dimensions;
pub mod historical;
pub mod historical_stats;
pub mod record;
pub mod severity;
pub mod stats;

pub use dimensions::{aggregate, Aggregates, DimensionData};
pub use historical::{
    aggregate_historical, HistoricalAggregates, HistoricalDimensionData, IntervalData,
};
pub use historical_stats::{
    compare_historical_insights, extract_historical_insights, historical_to_aggregates,
    HistoricalInsights, MessageCount,
};
pub use record::{AttributeMap, AttributeValue, LogAttributes, LogRecord};
pub use severity::{should_skip, SeverityLevel};
pub use stats::{compare_insights, extract_insights, percent_change, Comparison, Insights, KeyCount};
