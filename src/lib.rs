//! logflow - periodic log aggregation and anomaly signal engine
//!
//! Samples structured log records, infers their schema, aggregates them along
//! every discovered dimension, clusters messages into templates and compares
//! the current window against a historical baseline.

pub mod aggregator_core;
pub mod fuzzy;
pub mod pipeline;
pub mod schema;
