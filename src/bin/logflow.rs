//! logflow runtime
//!
//! Runs the periodic aggregation loop and forwards every result through the
//! anomaly analyzer and, when the verdict asks for it, the notifier.
//!
//! Usage:
//!   cargo run --release --bin logflow
//!
//! Environment variables:
//!   LOG_SEVERITY - ALL | MEDIUM | SEVERE (default: MEDIUM)
//!   TIME_INTERVAL - current window (default: FIFTEEN_MINUTES)
//!   HISTORICAL_TIME_INTERVAL - baseline window (default: ONE_DAY)
//!   LOG_QUERY - source query (default: *)
//!   LOG_SOURCE_PATH - JSONL records file (default: logs/records.jsonl)
//!   ANALYZER_URL - analyzer endpoint; without it results are only logged
//!   NOTIFY_WEBHOOK_URL - webhook for summaries; without it summaries are logged

use dotenv::dotenv;
use log::{error, info, warn};
use logflow::pipeline::{
    process_result, spawn_periodic_aggregation, AnomalyAnalyzer, HttpAnalyzer, JsonlLogSource,
    LogNotifier, LogSource, Notifier, PipelineConfig, WebhookNotifier,
};
use logflow::schema::SchemaCache;
use std::sync::Arc;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    info!("🚀 logflow - periodic log analysis");

    let config = PipelineConfig::from_env()?;
    info!("✅ Configuration loaded");
    info!("   ├─ Time interval: {}", config.time_window);
    info!("   ├─ Historical interval: {}", config.historical_window);
    info!("   ├─ Log severity: {}", config.severity);
    info!("   ├─ Query: {}", config.query);
    info!("   ├─ Schema refresh: every {} cycles", config.schema_refresh_every);
    info!("   └─ Log source: {}", config.log_source_path);

    let analyzer: Option<Box<dyn AnomalyAnalyzer>> = match &config.analyzer_url {
        Some(url) => {
            let analyzer = HttpAnalyzer::new(
                url.clone(),
                config.analyzer_token.clone(),
                config.analyzer_timeout(),
            )?;
            info!("🧠 Analyzer endpoint: {}", analyzer.url());
            Some(Box::new(analyzer) as Box<dyn AnomalyAnalyzer>)
        }
        None => {
            warn!("⚠️  ANALYZER_URL not set, aggregation results will only be logged");
            None
        }
    };

    let notifier: Box<dyn Notifier> = match &config.notify_webhook_url {
        Some(url) => Box::new(WebhookNotifier::new(url.clone())?),
        None => {
            info!("NOTIFY_WEBHOOK_URL not set, summaries go to the log");
            Box::new(LogNotifier)
        }
    };

    let source: Arc<dyn LogSource> = Arc::new(JsonlLogSource::new(&config.log_source_path));
    let cache = Arc::new(SchemaCache::new(config.schema_refresh_every));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (mut results, handle) = spawn_periodic_aggregation(config, source, cache, shutdown_rx);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("⚠️  Received CTRL+C, shutting down..."),
            Err(err) => error!("❌ Failed to listen for CTRL+C: {}", err),
        }
        let _ = shutdown_tx.send(true);
    });

    info!("🔄 Press CTRL+C to shutdown gracefully");

    while let Some(result) = results.recv().await {
        match &analyzer {
            Some(analyzer) => {
                let outcome = process_result(&result, analyzer.as_ref(), notifier.as_ref()).await;
                if let Err(e) = outcome {
                    error!("❌ Error processing aggregation result: {}", e);
                }
            }
            None => {
                let fields: Vec<&String> = result.comparisons.keys().collect();
                info!("📊 Aggregation result ready for {} fields: {:?}", fields.len(), fields);
            }
        }
    }

    handle.await?;
    info!("✅ logflow stopped");
    Ok(())
}
