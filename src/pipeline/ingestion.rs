//! Log source boundary and the bundled JSONL file source

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use super::windows::TimeWindow;
use crate::aggregator_core::record::{lookup_path, AttributeValue, LogRecord};

#[derive(Debug)]
pub enum IngestError {
    Io(std::io::Error),
    Source(String),
}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        IngestError::Io(err)
    }
}

impl std::fmt::Display for IngestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestError::Io(e) => write!(f, "IO error: {}", e),
            IngestError::Source(e) => write!(f, "Log source error: {}", e),
        }
    }
}

impl std::error::Error for IngestError {}

/// Source of log records for a trailing time window
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Fetch every record in `[now - window, now]` that matches `query`
    async fn fetch(&self, window: TimeWindow, query: &str) -> Result<Vec<LogRecord>, IngestError>;

    /// Source name for logging
    fn source_type(&self) -> &'static str;
}

/// Reads newline-delimited JSON records from a file on every fetch
pub struct JsonlLogSource {
    path: PathBuf,
}

impl JsonlLogSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LogSource for JsonlLogSource {
    async fn fetch(&self, window: TimeWindow, query: &str) -> Result<Vec<LogRecord>, IngestError> {
        let content = tokio::fs::read_to_string(&self.path).await?;

        let end = Utc::now();
        let start = end - chrono::Duration::seconds(window.duration_secs() as i64);
        let query = Query::parse(query);

        let mut records = Vec::new();
        let mut malformed = 0usize;
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record = match LogRecord::from_jsonl(line) {
                Ok(record) => record,
                Err(e) => {
                    log::warn!(
                        "⚠️  Skipping malformed line {} in {}: {}",
                        line_no + 1,
                        self.path.display(),
                        e
                    );
                    malformed += 1;
                    continue;
                }
            };
            if in_window(&record, start, end) && query.matches(&record) {
                records.push(record);
            }
        }

        log::debug!(
            "📥 Fetched {} records for {} from {} ({} malformed)",
            records.len(),
            window,
            self.path.display(),
            malformed
        );
        Ok(records)
    }

    fn source_type(&self) -> &'static str {
        "jsonl"
    }
}

fn in_window(record: &LogRecord, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    record
        .timestamp()
        .map(|ts| ts >= start && ts <= end)
        .unwrap_or(false)
}

#[derive(Debug, PartialEq)]
enum Term {
    Field { key: String, value: String },
    Text(String),
}

/// Whitespace-separated terms, all of which must match
#[derive(Debug, PartialEq)]
pub struct Query {
    terms: Vec<Term>,
}

impl Query {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw == "*" {
            return Self { terms: Vec::new() };
        }

        let terms = raw
            .split_whitespace()
            .map(|term| match term.split_once(':') {
                Some((key, value)) if !key.is_empty() && !value.is_empty() => Term::Field {
                    key: key.to_string(),
                    value: value.to_string(),
                },
                _ => Term::Text(term.to_lowercase()),
            })
            .collect();
        Self { terms }
    }

    pub fn matches_all(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn matches(&self, record: &LogRecord) -> bool {
        if self.matches_all() {
            return true;
        }
        let attrs = match &record.attributes {
            Some(attrs) => attrs,
            None => return false,
        };

        self.terms.iter().all(|term| match term {
            Term::Field { key, value } => match key.as_str() {
                "status" => attrs
                    .status
                    .as_deref()
                    .map(|s| s.eq_ignore_ascii_case(value))
                    .unwrap_or(false),
                "host" => attrs.host.as_deref() == Some(value.as_str()),
                "service" => attrs.service.as_deref() == Some(value.as_str()),
                _ => attrs
                    .attributes
                    .as_ref()
                    .and_then(|bag| lookup_path(bag, key))
                    .and_then(AttributeValue::as_dimension_value)
                    .map(|v| v == *value)
                    .unwrap_or(false),
            },
            Term::Text(text) => record
                .message()
                .map(|m| m.to_lowercase().contains(text.as_str()))
                .unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn line(status: &str, service: &str, message: &str, ts: DateTime<Utc>) -> String {
        serde_json::json!({
            "id": format!("{}-{}", service, ts.timestamp()),
            "attributes": {
                "status": status,
                "host": "web-01",
                "service": service,
                "message": message,
                "timestamp": ts.to_rfc3339(),
                "attributes": { "env": "prod", "http": { "status_code": 503 } }
            }
        })
        .to_string()
    }

    fn record_from(line: &str) -> LogRecord {
        LogRecord::from_jsonl(line).unwrap()
    }

    #[tokio::test]
    async fn test_jsonl_source_filters_window_and_skips_malformed() {
        let now = Utc::now();
        let mut file = NamedTempFile::new().unwrap();
        let ago = |minutes: i64| now - chrono::Duration::minutes(minutes);
        writeln!(file, "{}", line("error", "api", "timeout", ago(2))).unwrap();
        writeln!(file, "{{not json").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "{}", line("error", "api", "old", ago(180))).unwrap();
        writeln!(file, "{}", line("warning", "worker", "slow", ago(10))).unwrap();
        file.flush().unwrap();

        let source = JsonlLogSource::new(file.path());
        let records = source.fetch(TimeWindow::FifteenMinutes, "*").await.unwrap();
        assert_eq!(records.len(), 2);

        let records = source.fetch(TimeWindow::FiveMinutes, "").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message(), Some("timeout"));
    }

    #[tokio::test]
    async fn test_jsonl_source_applies_query() {
        let now = Utc::now() - chrono::Duration::minutes(1);
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", line("ERROR", "api", "Connection Timeout", now)).unwrap();
        writeln!(file, "{}", line("warning", "worker", "queue backlog", now)).unwrap();
        file.flush().unwrap();

        let source = JsonlLogSource::new(file.path());
        let errors = source.fetch(TimeWindow::OneHour, "status:error").await.unwrap();
        assert_eq!(errors.len(), 1);

        let worker = source.fetch(TimeWindow::OneHour, "service:worker backlog").await.unwrap();
        assert_eq!(worker.len(), 1);
        assert_eq!(worker[0].message(), Some("queue backlog"));
    }

    #[tokio::test]
    async fn test_jsonl_source_missing_file() {
        let source = JsonlLogSource::new("/nonexistent/logflow/records.jsonl");
        let result = source.fetch(TimeWindow::OneHour, "*").await;
        assert!(matches!(result, Err(IngestError::Io(_))));
    }

    #[test]
    fn test_query_terms() {
        let record = record_from(&line("error", "api", "Disk quota exceeded", Utc::now()));

        assert!(Query::parse("*").matches(&record));
        assert!(Query::parse("  ").matches(&record));
        assert!(Query::parse("status:ERROR").matches(&record));
        assert!(Query::parse("host:web-01 service:api").matches(&record));
        assert!(Query::parse("env:prod http.status_code:503").matches(&record));
        assert!(Query::parse("quota").matches(&record));
        assert!(!Query::parse("service:worker").matches(&record));
        assert!(!Query::parse("quota missing").matches(&record));
        assert!(!Query::parse("env:staging").matches(&record));
    }

    #[test]
    fn test_query_rejects_records_without_attributes() {
        assert!(!Query::parse("status:error").matches(&LogRecord::default()));
        assert!(Query::parse("*").matches(&LogRecord::default()));
    }
}
