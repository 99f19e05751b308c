//! Named time windows for current and historical queries

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeWindow {
    OneMinute,
    FiveMinutes,
    TenMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    SixHours,
    TwelveHours,
    OneDay,
    OneWeek,
    OneMonth,
}

impl TimeWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::OneMinute => "ONE_MINUTE",
            TimeWindow::FiveMinutes => "FIVE_MINUTES",
            TimeWindow::TenMinutes => "TEN_MINUTES",
            TimeWindow::FifteenMinutes => "FIFTEEN_MINUTES",
            TimeWindow::ThirtyMinutes => "THIRTY_MINUTES",
            TimeWindow::OneHour => "ONE_HOUR",
            TimeWindow::SixHours => "SIX_HOURS",
            TimeWindow::TwelveHours => "TWELVE_HOURS",
            TimeWindow::OneDay => "ONE_DAY",
            TimeWindow::OneWeek => "ONE_WEEK",
            TimeWindow::OneMonth => "ONE_MONTH",
        }
    }

    pub fn duration_secs(&self) -> u64 {
        match self {
            TimeWindow::OneMinute => MINUTE,
            TimeWindow::FiveMinutes => 5 * MINUTE,
            TimeWindow::TenMinutes => 10 * MINUTE,
            TimeWindow::FifteenMinutes => 15 * MINUTE,
            TimeWindow::ThirtyMinutes => 30 * MINUTE,
            TimeWindow::OneHour => HOUR,
            TimeWindow::SixHours => 6 * HOUR,
            TimeWindow::TwelveHours => 12 * HOUR,
            TimeWindow::OneDay => DAY,
            TimeWindow::OneWeek => 7 * DAY,
            TimeWindow::OneMonth => 30 * DAY,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs())
    }

    /// All windows, shortest first
    pub fn all() -> [TimeWindow; 11] {
        [
            TimeWindow::OneMinute,
            TimeWindow::FiveMinutes,
            TimeWindow::TenMinutes,
            TimeWindow::FifteenMinutes,
            TimeWindow::ThirtyMinutes,
            TimeWindow::OneHour,
            TimeWindow::SixHours,
            TimeWindow::TwelveHours,
            TimeWindow::OneDay,
            TimeWindow::OneWeek,
            TimeWindow::OneMonth,
        ]
    }

    /// Smallest window strictly longer than this one
    pub fn next_larger(&self) -> Option<TimeWindow> {
        TimeWindow::all()
            .into_iter()
            .find(|w| w.duration_secs() > self.duration_secs())
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTimeWindow(pub String);

impl fmt::Display for UnknownTimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown time window '{}'", self.0)
    }
}

impl std::error::Error for UnknownTimeWindow {}

impl FromStr for TimeWindow {
    type Err = UnknownTimeWindow;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeWindow::all()
            .into_iter()
            .find(|w| w.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownTimeWindow(s.to_string()))
    }
}
