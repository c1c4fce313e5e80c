//! Core record types for the triage pipeline
//!
//! This module defines the log records fetched for an area/VPN pair and the
//! failures derived from them by the detector.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp format used by the monitored log lines
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Severity level written in a log line
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    /// Level missing or not recognised
    Unknown,
}

impl LogLevel {
    fn parse(token: &str) -> Self {
        match token {
            "INFO" => LogLevel::Info,
            "WARNING" | "WARN" => LogLevel::Warning,
            "ERROR" => LogLevel::Error,
            _ => LogLevel::Unknown,
        }
    }
}

/// A single log record fetched for an area/VPN pair
///
/// Records are immutable once fetched and live only for the duration of one
/// triage operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogRecord {
    /// When the entry was written, if the line carried a parseable timestamp
    pub timestamp: Option<NaiveDateTime>,
    /// Severity level of the entry
    pub level: LogLevel,
    /// Component that emitted the entry (e.g. `VPN-Y`, `AREA-A`)
    pub source: String,
    /// The log message content
    pub message: String,
    /// The line as it was read
    pub raw: String,
}

impl LogRecord {
    /// Parse a line of the form `YYYY-MM-DD HH:MM:SS LEVEL - SOURCE: message`
    ///
    /// Lines that do not follow that shape are kept as `Unknown`-level records
    /// whose message is the whole trimmed line, so parsing never drops input.
    ///
    /// # Example
    ///
    /// ```
    /// use triage::events::{LogLevel, LogRecord};
    ///
    /// let line = "2025-06-21 10:00:00 INFO - VPN-X: Conexão estabelecida.";
    /// let record = LogRecord::from_line(line);
    /// assert_eq!(record.level, LogLevel::Info);
    /// assert_eq!(record.source, "VPN-X");
    /// assert_eq!(record.message, "Conexão estabelecida.");
    /// ```
    pub fn from_line(line: &str) -> Self {
        let line = line.trim();
        Self::parse_structured(line).unwrap_or_else(|| Self {
            timestamp: None,
            level: LogLevel::Unknown,
            source: String::new(),
            message: line.to_string(),
            raw: line.to_string(),
        })
    }

    fn parse_structured(line: &str) -> Option<Self> {
        let stamp = line.get(..19)?;
        let timestamp = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
        let rest = line.get(19..)?.trim_start();

        let (level, rest) = rest.split_once(" - ")?;
        let (source, message) = rest.split_once(": ")?;

        Some(Self {
            timestamp: Some(timestamp),
            level: LogLevel::parse(level.trim()),
            source: source.trim().to_string(),
            message: message.trim().to_string(),
            raw: line.to_string(),
        })
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A log record classified as a failure
///
/// Borrows the record it was derived from; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure<'a> {
    /// The scanned record this failure wraps
    pub record: &'a LogRecord,
    /// Which indicators matched
    pub reason: String,
}

impl fmt::Display for Failure<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FAILURE DETECTED: {}", self.record.raw)
    }
}
