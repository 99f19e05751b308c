//! Severity filter deciding which log statuses take part in aggregation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeverityLevel {
    /// Aggregate everything, including debug and info logs
    #[serde(rename = "ALL")]
    All,
    /// Aggregate warnings and errors
    #[serde(rename = "MEDIUM")]
    Medium,
    /// Aggregate errors only
    #[serde(rename = "SEVERE")]
    Severe,
}

impl SeverityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityLevel::All => "ALL",
            SeverityLevel::Medium => "MEDIUM",
            SeverityLevel::Severe => "SEVERE",
        }
    }

    pub fn all() -> [SeverityLevel; 3] {
        [SeverityLevel::All, SeverityLevel::Medium, SeverityLevel::Severe]
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSeverity(pub String);

impl fmt::Display for UnknownSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown severity level '{}' (expected ALL, MEDIUM or SEVERE)", self.0)
    }
}

impl std::error::Error for UnknownSeverity {}

impl FromStr for SeverityLevel {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SeverityLevel::all()
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSeverity(s.to_string()))
    }
}

/// Whether a record with `status` is excluded at `level`
pub fn should_skip(status: &str, level: SeverityLevel) -> bool {
    let status = status.to_lowercase();
    match level {
        SeverityLevel::All => false,
        SeverityLevel::Medium => matches!(status.as_str(), "info" | "debug"),
        SeverityLevel::Severe => matches!(status.as_str(), "info" | "warning" | "debug"),
    }
}
