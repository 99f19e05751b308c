//! # Periodic Log Analysis Pipeline
//!
//! Wires the aggregation engine to its collaborators:
//!
//! ```text
//! LogSource (current + historical window)
//!     ↓
//! scheduler::run_cycle  → SchemaCache, aggregate, aggregate_historical, compare
//!     ↓ mpsc (capacity 1)
//! AnomalyAnalyzer       → AnalysisVerdict
//!     ↓ (send_summary)
//! Notifier              → webhook or log
//! ```
//!
//! ## Module Organization
//!
//! - `windows` - Named time windows (ONE_MINUTE … ONE_MONTH)
//! - `config` - Environment configuration
//! - `ingestion` - `LogSource` trait and the JSONL file source
//! - `analysis` - `AnomalyAnalyzer` trait and the HTTP analyzer
//! - `notifier` - `Notifier` trait, summary formatting and result dispatch
//! - `scheduler` - Cycle execution and the periodic background task

pub mod analysis;
pub mod config;
pub mod ingestion;
pub mod notifier;
pub mod scheduler;
pub mod windows;

pub use analysis::{
    verdict_schema, AnalysisError, AnalysisVerdict, AnomalyAnalyzer, HttpAnalyzer,
    ANALYSIS_INSTRUCTIONS,
};
pub use config::{ConfigError, PipelineConfig};
pub use ingestion::{IngestError, JsonlLogSource, LogSource};
pub use notifier::{
    format_summary, process_result, LogNotifier, Notifier, NotifyError, WebhookNotifier,
};
pub use scheduler::{run_cycle, spawn_periodic_aggregation, AggregationResult};
pub use windows::TimeWindow;
