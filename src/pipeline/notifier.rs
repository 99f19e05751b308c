//! Notification sink for analyzer verdicts

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use super::analysis::{AnalysisError, AnalysisVerdict, AnomalyAnalyzer};
use super::scheduler::AggregationResult;

#[derive(Debug)]
pub enum NotifyError {
    Http(reqwest::Error),
    Status(u16),
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Http(err)
    }
}

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyError::Http(e) => write!(f, "Notification request failed: {}", e),
            NotifyError::Status(code) => write!(f, "Notification endpoint returned HTTP {}", code),
        }
    }
}

impl std::error::Error for NotifyError {}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, verdict: &AnalysisVerdict) -> Result<(), NotifyError>;

    /// Notifier name for logging
    fn notifier_type(&self) -> &'static str;
}

fn severity_marker(severity: &str) -> &'static str {
    match severity.to_lowercase().as_str() {
        "critical" => "🔴",
        "high" => "🟠",
        "medium" => "🟡",
        _ => "🟢",
    }
}

/// Render a verdict as a plain-text summary message
pub fn format_summary(verdict: &AnalysisVerdict) -> String {
    let mut lines = vec![
        format!(
            "{} Log Analysis — {}",
            severity_marker(&verdict.severity),
            verdict.severity.to_uppercase()
        ),
        String::new(),
        format!("*Signal Strength:* {}/10", verdict.signal_strength),
        format!("*Severity:* {}", verdict.severity),
        String::new(),
        "*Reasoning:*".to_string(),
        verdict.reasoning.clone(),
    ];

    if !verdict.key_points.is_empty() {
        lines.push(String::new());
        lines.push("*Key Points:*".to_string());
        lines.extend(verdict.key_points.iter().map(|p| format!("• {}", p)));
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(&verdict.timestamp) {
        lines.push(String::new());
        lines.push(format!(
            "Analyzed at: {}",
            ts.with_timezone(&Utc).format("%a, %d %b %Y %H:%M:%S UTC")
        ));
    }

    lines.join("\n")
}

/// Posts `{"text": <summary>}` to an incoming-webhook URL
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, verdict: &AnalysisVerdict) -> Result<(), NotifyError> {
        let body = serde_json::json!({ "text": format_summary(verdict) });
        let response = self.client.post(&self.url).json(&body).send().await?;

        if !response.status().is_success() {
            log::error!("❌ Webhook rejected summary: HTTP {}", response.status());
            return Err(NotifyError::Status(response.status().as_u16()));
        }

        log::info!("📣 Summary posted to webhook (severity: {})", verdict.severity);
        Ok(())
    }

    fn notifier_type(&self) -> &'static str {
        "webhook"
    }
}

/// Writes the summary to the application log
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, verdict: &AnalysisVerdict) -> Result<(), NotifyError> {
        log::info!("📣 Analysis summary\n{}", format_summary(verdict));
        Ok(())
    }

    fn notifier_type(&self) -> &'static str {
        "log"
    }
}

#[derive(Debug)]
pub enum ProcessError {
    Serialization(serde_json::Error),
    Analysis(AnalysisError),
    Notify(NotifyError),
}

impl From<serde_json::Error> for ProcessError {
    fn from(err: serde_json::Error) -> Self {
        ProcessError::Serialization(err)
    }
}

impl From<AnalysisError> for ProcessError {
    fn from(err: AnalysisError) -> Self {
        ProcessError::Analysis(err)
    }
}

impl From<NotifyError> for ProcessError {
    fn from(err: NotifyError) -> Self {
        ProcessError::Notify(err)
    }
}

impl std::fmt::Display for ProcessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessError::Serialization(e) => {
                write!(f, "Failed to serialize aggregation result: {}", e)
            }
            ProcessError::Analysis(e) => write!(f, "{}", e),
            ProcessError::Notify(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ProcessError {}

/// Analyze one aggregation envelope and notify when the verdict asks for it
///
/// Returns whether a notification was sent.
pub async fn process_result(
    result: &AggregationResult,
    analyzer: &dyn AnomalyAnalyzer,
    notifier: &dyn Notifier,
) -> Result<bool, ProcessError> {
    let payload = serde_json::to_string(result)?;
    let verdict = analyzer.analyze(&payload).await?;

    if !verdict.send_summary {
        log::info!(
            "Analysis below alert threshold (strength {}, severity {}), skipping notification",
            verdict.signal_strength,
            verdict.severity
        );
        return Ok(false);
    }

    log::info!(
        "🚨 Sending analysis via {} notifier (strength {}, severity {})",
        notifier.notifier_type(),
        verdict.signal_strength,
        verdict.severity
    );
    notifier.notify(&verdict).await?;
    Ok(true)
}
