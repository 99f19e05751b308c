//! Pipeline configuration from environment variables

use std::env;
use std::time::Duration;

use super::windows::TimeWindow;
use crate::aggregator_core::SeverityLevel;
use crate::schema::cache::DEFAULT_REFRESH_EVERY;

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Configuration for the periodic aggregation runtime
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Severity filter applied before aggregation
    pub severity: SeverityLevel,

    /// Current window; also the cycle period and historical interval width
    pub time_window: TimeWindow,

    /// Baseline window, always longer than `time_window`
    pub historical_window: TimeWindow,

    /// Query forwarded to the log source
    pub query: String,

    /// Rediscover the schema every N cycles
    pub schema_refresh_every: usize,

    /// JSONL file read by the bundled log source
    pub log_source_path: String,

    pub analyzer_url: Option<String>,
    pub analyzer_token: Option<String>,
    pub analyzer_timeout_secs: u64,

    pub notify_webhook_url: Option<String>,
}

impl PipelineConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `LOG_SEVERITY` (default: MEDIUM)
    /// - `TIME_INTERVAL` (default: FIFTEEN_MINUTES)
    /// - `HISTORICAL_TIME_INTERVAL` (default: ONE_DAY)
    /// - `LOG_QUERY` (default: *)
    /// - `SCHEMA_REFRESH_EVERY` (default: 10)
    /// - `LOG_SOURCE_PATH` (default: logs/records.jsonl)
    /// - `ANALYZER_URL`, `ANALYZER_TOKEN` (optional)
    /// - `ANALYZER_TIMEOUT_SECS` (default: 30)
    /// - `NOTIFY_WEBHOOK_URL` (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let severity = match lookup("LOG_SEVERITY") {
            Some(raw) => raw.parse::<SeverityLevel>().unwrap_or_else(|_| {
                log::warn!("Invalid LOG_SEVERITY '{}', defaulting to MEDIUM", raw);
                SeverityLevel::Medium
            }),
            None => SeverityLevel::Medium,
        };

        let time_window = parse_window(&lookup, "TIME_INTERVAL", TimeWindow::FifteenMinutes);
        let mut historical_window =
            parse_window(&lookup, "HISTORICAL_TIME_INTERVAL", TimeWindow::OneDay);

        if historical_window <= time_window {
            let adjusted = time_window.next_larger().ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "no window is longer than TIME_INTERVAL {} for HISTORICAL_TIME_INTERVAL",
                    time_window
                ))
            })?;
            log::warn!(
                "HISTORICAL_TIME_INTERVAL {} is not longer than TIME_INTERVAL {}, using {}",
                historical_window,
                time_window,
                adjusted
            );
            historical_window = adjusted;
        }

        let query = lookup("LOG_QUERY")
            .filter(|q| !q.trim().is_empty())
            .unwrap_or_else(|| "*".to_string());

        let schema_refresh_every = lookup("SCHEMA_REFRESH_EVERY")
            .and_then(|s| s.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(DEFAULT_REFRESH_EVERY);

        let log_source_path = lookup("LOG_SOURCE_PATH")
            .unwrap_or_else(|| "logs/records.jsonl".to_string());

        let analyzer_timeout_secs = lookup("ANALYZER_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            severity,
            time_window,
            historical_window,
            query,
            schema_refresh_every,
            log_source_path,
            analyzer_url: lookup("ANALYZER_URL").filter(|s| !s.is_empty()),
            analyzer_token: lookup("ANALYZER_TOKEN").filter(|s| !s.is_empty()),
            analyzer_timeout_secs,
            notify_webhook_url: lookup("NOTIFY_WEBHOOK_URL").filter(|s| !s.is_empty()),
        })
    }

    pub fn cycle_period(&self) -> Duration {
        self.time_window.duration()
    }

    pub fn analyzer_timeout(&self) -> Duration {
        Duration::from_secs(self.analyzer_timeout_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            severity: SeverityLevel::Medium,
            time_window: TimeWindow::FifteenMinutes,
            historical_window: TimeWindow::OneDay,
            query: "*".to_string(),
            schema_refresh_every: DEFAULT_REFRESH_EVERY,
            log_source_path: "logs/records.jsonl".to_string(),
            analyzer_url: None,
            analyzer_token: None,
            analyzer_timeout_secs: 30,
            notify_webhook_url: None,
        }
    }
}

fn parse_window<F>(lookup: &F, key: &str, default: TimeWindow) -> TimeWindow
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("Invalid {} '{}', defaulting to {}", key, raw, default);
            default
        }),
        None => default,
    }
}
