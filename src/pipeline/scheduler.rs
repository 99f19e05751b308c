//! Periodic aggregation scheduler
//!
//! One background task runs a cycle immediately and then once per current
//! window. Each cycle fetches the current and historical windows, resolves the
//! schema, aggregates both sides and publishes a comparison envelope.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::config::PipelineConfig;
use super::ingestion::{IngestError, LogSource};
use crate::aggregator_core::{
    aggregate, aggregate_historical, compare_insights, extract_insights, historical_to_aggregates,
    Aggregates, Comparison, HistoricalAggregates,
};
use crate::schema::{Schema, SchemaCache};

/// Envelope handed to the analyzer after every cycle
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    /// Per-field comparison of the current window against the baseline
    pub comparisons: BTreeMap<String, Comparison>,
    pub current_logs: Aggregates,
    pub historical_logs: HistoricalAggregates,
    pub schema: Schema,
}

/// Execute one aggregation cycle
pub async fn run_cycle(
    config: &PipelineConfig,
    source: &dyn LogSource,
    cache: &SchemaCache,
) -> Result<AggregationResult, IngestError> {
    log::info!(
        "🔄 Running aggregation cycle ({} vs {})",
        config.time_window,
        config.historical_window
    );

    let current = source.fetch(config.time_window, &config.query).await.map_err(|e| {
        log::error!("❌ Failed to fetch logs for current window: {}", e);
        e
    })?;
    let historical = source.fetch(config.historical_window, &config.query).await.map_err(|e| {
        log::error!("❌ Failed to fetch logs for historical window: {}", e);
        e
    })?;

    let schema = cache.get_from(current.iter().chain(historical.iter()));

    log::info!(
        "🧬 Schema resolved: {} fields, {} current logs, {} historical logs",
        schema.fields.len(),
        current.len(),
        historical.len()
    );

    let current_logs = aggregate(&current, &schema, config.severity);
    let historical_logs = aggregate_historical(
        &historical,
        &schema,
        config.time_window.duration(),
        config.severity,
    );
    let baseline = historical_to_aggregates(&historical_logs);

    let comparisons = schema
        .fields
        .iter()
        .map(|field| {
            let current_insights = extract_insights(&current_logs, &field.name);
            let historical_insights = extract_insights(&baseline, &field.name);
            (field.name.clone(), compare_insights(&current_insights, &historical_insights))
        })
        .collect();

    Ok(AggregationResult {
        comparisons,
        current_logs,
        historical_logs,
        schema: Schema::clone(&schema),
    })
}

/// Resolves once shutdown is signalled or the sender is gone
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// Spawn the periodic aggregation task
///
/// Publication is a handoff: after sending, the task waits until the consumer
/// has taken the result before the next tick, so at most one result is in
/// flight. The returned receiver closes when shutdown is signalled; the task
/// also stops when the receiver is dropped.
pub fn spawn_periodic_aggregation(
    config: PipelineConfig,
    source: Arc<dyn LogSource>,
    cache: Arc<SchemaCache>,
    mut shutdown: watch::Receiver<bool>,
) -> (mpsc::Receiver<AggregationResult>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(1);

    let handle = tokio::spawn(async move {
        log::info!(
            "🚀 Starting periodic aggregation (every {}, source: {})",
            config.time_window,
            source.source_type()
        );

        let mut ticker = interval(config.cycle_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // First tick completes immediately
            tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                _ = ticker.tick() => {}
            }

            let outcome = tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                outcome = run_cycle(&config, source.as_ref(), &cache) => outcome,
            };

            let result = match outcome {
                Ok(result) => result,
                Err(e) => {
                    log::warn!("⚠️  Aggregation cycle aborted: {}", e);
                    continue;
                }
            };

            tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                sent = tx.send(result) => {
                    if sent.is_err() {
                        log::info!("Result consumer dropped, stopping aggregation");
                        break;
                    }
                }
            }

            // The single slot frees up only once the consumer has received the result
            tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                accepted = tx.reserve() => {
                    if accepted.is_err() {
                        log::info!("Result consumer dropped, stopping aggregation");
                        break;
                    }
                    log::info!("✅ Aggregation cycle completed");
                }
            }
        }

        log::info!("🛑 Stopping periodic aggregation");
    });

    (rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator_core::record::{LogAttributes, LogRecord};
    use crate::aggregator_core::SeverityLevel;
    use crate::pipeline::windows::TimeWindow;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct StaticSource {
        current: Vec<LogRecord>,
        historical: Vec<LogRecord>,
    }

    #[async_trait]
    impl LogSource for StaticSource {
        async fn fetch(
            &self,
            window: TimeWindow,
            _query: &str,
        ) -> Result<Vec<LogRecord>, IngestError> {
            if window == TimeWindow::FifteenMinutes {
                Ok(self.current.clone())
            } else {
                Ok(self.historical.clone())
            }
        }

        fn source_type(&self) -> &'static str {
            "static"
        }
    }

    struct FailingSource;

    #[async_trait]
    impl LogSource for FailingSource {
        async fn fetch(
            &self,
            _window: TimeWindow,
            _query: &str,
        ) -> Result<Vec<LogRecord>, IngestError> {
            Err(IngestError::Source("backend unavailable".to_string()))
        }

        fn source_type(&self) -> &'static str {
            "failing"
        }
    }

    #[derive(Default)]
    struct CountingSource {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl LogSource for CountingSource {
        async fn fetch(
            &self,
            _window: TimeWindow,
            _query: &str,
        ) -> Result<Vec<LogRecord>, IngestError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(vec![record("error", "web-01", 0)])
        }

        fn source_type(&self) -> &'static str {
            "counting"
        }
    }

    fn record(status: &str, host: &str, minutes_ago: i64) -> LogRecord {
        LogRecord {
            id: None,
            attributes: Some(LogAttributes {
                status: Some(status.to_string()),
                host: Some(host.to_string()),
                message: Some(format!("{} on {}", status, host)),
                timestamp: Some(Utc::now() - chrono::Duration::minutes(minutes_ago)),
                ..Default::default()
            }),
        }
    }

    fn test_source() -> StaticSource {
        StaticSource {
            current: vec![record("error", "web-01", 1), record("error", "web-02", 2)],
            historical: vec![
                record("error", "web-01", 120),
                record("warning", "web-01", 60),
                record("error", "web-01", 30),
            ],
        }
    }

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            severity: SeverityLevel::All,
            ..PipelineConfig::default()
        }
    }

    #[tokio::test]
    async fn test_run_cycle_compares_every_field() {
        let cache = SchemaCache::new(10);
        let result = run_cycle(&test_config(), &test_source(), &cache).await.unwrap();

        assert_eq!(result.schema.field_names(), vec!["host", "status"]);
        assert_eq!(result.comparisons.len(), 2);

        let status = &result.comparisons["status"];
        assert_eq!(status["TotalCountDiff"], -1.0);
        assert_eq!(status["error_CountDiff"], 0.0);

        let host = &result.comparisons["host"];
        assert!(host["web-02_PercentChange"].is_infinite());

        assert_eq!(result.current_logs.dimension("status").unwrap().counts["error"], 2);
        let intervals = &result.historical_logs.dimension("status").unwrap().intervals;
        assert_eq!(intervals.len(), 7);
        assert_eq!(intervals.iter().map(|i| i.count).sum::<u64>(), 3);
    }

    #[tokio::test]
    async fn test_run_cycle_propagates_fetch_errors() {
        let cache = SchemaCache::new(10);
        let result = run_cycle(&test_config(), &FailingSource, &cache).await;
        assert!(matches!(result, Err(IngestError::Source(_))));
        assert!(cache.current().is_none());
    }

    #[tokio::test]
    async fn test_envelope_json_keys() {
        let cache = SchemaCache::new(10);
        let result = run_cycle(&test_config(), &test_source(), &cache).await.unwrap();
        let json = serde_json::to_value(&result).unwrap();

        for key in ["comparisons", "currentLogs", "historicalLogs", "schema"] {
            assert!(json.get(key).is_some(), "missing key {}", key);
        }
        assert!(json["comparisons"]["host"]["web-02_PercentChange"].is_null());
    }

    #[tokio::test]
    async fn test_spawned_task_publishes_then_stops_on_shutdown() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (mut rx, handle) = spawn_periodic_aggregation(
            test_config(),
            Arc::new(test_source()),
            Arc::new(SchemaCache::new(10)),
            shutdown_rx,
        );

        let first = rx.recv().await.expect("first cycle runs immediately");
        assert_eq!(first.comparisons.len(), 2);

        shutdown_tx.send(true).unwrap();
        assert!(rx.recv().await.is_none());
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_spawned_task_stops_when_sender_dropped() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (mut rx, handle) = spawn_periodic_aggregation(
            test_config(),
            Arc::new(FailingSource),
            Arc::new(SchemaCache::new(10)),
            shutdown_rx,
        );

        drop(shutdown_tx);
        assert!(rx.recv().await.is_none());
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_cycle_waits_for_consumer_to_accept() {
        let source = Arc::new(CountingSource::default());
        let config = PipelineConfig {
            time_window: TimeWindow::OneMinute,
            historical_window: TimeWindow::OneHour,
            ..test_config()
        };
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (mut rx, handle) = spawn_periodic_aggregation(
            config,
            source.clone(),
            Arc::new(SchemaCache::new(10)),
            shutdown_rx,
        );

        // Five periods pass without the consumer receiving anything
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);

        assert!(rx.recv().await.is_some());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 4);

        shutdown_tx.send(true).unwrap();
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_run_cycle_leaves_cached_schema_untouched_on_hit() {
        let cache = SchemaCache::new(10);
        run_cycle(&test_config(), &test_source(), &cache).await.unwrap();
        let first = cache.current().unwrap();

        let narrower = StaticSource {
            current: vec![record("error", "web-01", 1)],
            historical: Vec::new(),
        };
        let result = run_cycle(&test_config(), &narrower, &cache).await.unwrap();
        assert!(Arc::ptr_eq(&first, &cache.current().unwrap()));
        assert_eq!(result.schema.field_names(), vec!["host", "status"]);
    }
}
