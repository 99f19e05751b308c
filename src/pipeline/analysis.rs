//! Anomaly analyzer boundary
//!
//! The analyzer receives the serialized aggregation envelope and returns a
//! verdict. [`HttpAnalyzer`] forwards the envelope to an HTTP endpoint together
//! with the analysis instructions and the JSON shape expected back.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Instructions sent with every envelope
pub const ANALYSIS_INSTRUCTIONS: &str = "You are an expert log analysis agent. You analyze \
aggregated log data from monitoring systems to detect anomalies, surface issues and provide \
actionable insights.

You receive structured aggregation data that includes:
- Current interval log aggregations grouped by dynamically discovered dimensions \
(e.g. status, host, service, custom fields)
- Historical interval data for comparison
- Statistical comparisons including count diffs, percentage changes and z-scores
- Message clusters showing patterns in log messages

Your job is to:
1. Assess whether the current log patterns represent a noteworthy anomaly compared to \
historical baselines
2. Determine the severity of any detected anomalies
3. Decide whether this warrants an alert to the engineering team
4. Provide clear, concise reasoning and key points

Guidelines:
- A signal strength of 1-3 means normal/low activity, no alert needed
- A signal strength of 4-6 means moderate deviation, worth monitoring
- A signal strength of 7-10 means significant anomaly, alert recommended
- Set sendSummary to true only when signal strength >= 5
- Focus on error rate spikes, new error patterns, service degradation and unusual log \
volume changes
- Be specific about which dimensions and values are concerning
- Consider z-scores: values above 2.0 or below -2.0 indicate statistical significance

Respond with a single JSON object matching the response schema.";

#[derive(Debug)]
pub enum AnalysisError {
    Http(reqwest::Error),
    Status(u16),
    InvalidVerdict(serde_json::Error),
}

impl From<reqwest::Error> for AnalysisError {
    fn from(err: reqwest::Error) -> Self {
        AnalysisError::Http(err)
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::InvalidVerdict(err)
    }
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::Http(e) => write!(f, "Analyzer request failed: {}", e),
            AnalysisError::Status(code) => write!(f, "Analyzer returned HTTP {}", code),
            AnalysisError::InvalidVerdict(e) => {
                write!(f, "Analyzer verdict could not be parsed: {}", e)
            }
        }
    }
}

impl std::error::Error for AnalysisError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisVerdict {
    /// Anomaly strength from 1 to 10
    #[serde(deserialize_with = "deserialize_strength")]
    pub signal_strength: u8,
    pub send_summary: bool,
    /// One of low, medium, high, critical
    pub severity: String,
    pub reasoning: String,
    #[serde(default)]
    pub key_points: Vec<String>,
    /// RFC 3339 time of the analysis
    #[serde(default)]
    pub timestamp: String,
}

/// Accept any JSON number and clamp it to the 1..=10 scale
fn deserialize_strength<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    Ok(raw.round().clamp(1.0, 10.0) as u8)
}

/// JSON schema of [`AnalysisVerdict`] as sent to the analyzer
pub fn verdict_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "signalStrength": {
                "type": "integer",
                "description": "Anomaly signal strength from 1-10"
            },
            "sendSummary": { "type": "boolean", "description": "Whether to send an alert" },
            "severity": { "type": "string", "description": "One of: low medium high critical" },
            "reasoning": { "type": "string", "description": "Concise explanation of the analysis" },
            "keyPoints": {
                "type": "array",
                "items": { "type": "string" },
                "description": "List of key observations"
            },
            "timestamp": { "type": "string", "description": "ISO 8601 timestamp of the analysis" }
        },
        "required": [
            "signalStrength",
            "sendSummary",
            "severity",
            "reasoning",
            "keyPoints",
            "timestamp"
        ]
    })
}

impl AnalysisVerdict {
    /// Parse a verdict body, stamping a missing time
    pub fn from_json(body: &str) -> Result<Self, AnalysisError> {
        let mut verdict: AnalysisVerdict = serde_json::from_str(body)?;
        if verdict.timestamp.trim().is_empty() {
            verdict.timestamp =
                chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        }
        Ok(verdict)
    }
}

#[async_trait]
pub trait AnomalyAnalyzer: Send + Sync {
    async fn analyze(&self, payload_json: &str) -> Result<AnalysisVerdict, AnalysisError>;
}

pub struct HttpAnalyzer {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl HttpAnalyzer {
    pub fn new(
        url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            token,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request body: instructions, envelope and the expected verdict shape
    pub fn request_body(payload_json: &str) -> serde_json::Value {
        serde_json::json!({
            "system": ANALYSIS_INSTRUCTIONS,
            "input": payload_json,
            "responseSchema": verdict_schema(),
        })
    }
}

#[async_trait]
impl AnomalyAnalyzer for HttpAnalyzer {
    async fn analyze(&self, payload_json: &str) -> Result<AnalysisVerdict, AnalysisError> {
        let body = Self::request_body(payload_json);

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(AnalysisError::Status(response.status().as_u16()));
        }

        let text = response.text().await?;
        let verdict = AnalysisVerdict::from_json(&text)?;
        log::debug!(
            "🧠 Analyzer verdict: strength={} severity={} send_summary={}",
            verdict.signal_strength,
            verdict.severity,
            verdict.send_summary
        );
        Ok(verdict)
    }
}
