use crate::config::DetectorConfig;
use crate::events::{Failure, LogRecord};

/// Classifies log records as failures by case-sensitive substring match
///
/// A record is a failure when its message contains any of the configured
/// patterns. Each record yields at most one failure regardless of how many
/// patterns match.
#[derive(Debug, Clone)]
pub struct FailureDetector {
    patterns: Vec<String>,
}

impl Default for FailureDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default().patterns)
    }
}

impl FailureDetector {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }

    /// Scan records in order and return the failures among them
    pub fn scan<'a>(&self, records: &'a [LogRecord]) -> Vec<Failure<'a>> {
        records
            .iter()
            .filter_map(|record| {
                let matched: Vec<&str> = self
                    .patterns
                    .iter()
                    .map(String::as_str)
                    .filter(|pattern| record.message.contains(pattern))
                    .collect();

                if matched.is_empty() {
                    None
                } else {
                    Some(Failure {
                        record,
                        reason: format!("message contains {:?}", matched),
                    })
                }
            })
            .collect()
    }
}
