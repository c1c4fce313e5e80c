use crate::error::TriageError;
use crate::events::LogRecord;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Capability to fetch the recent log records of an area/VPN pair
///
/// Implementations convert their own storage faults into
/// `TriageError::SourceUnavailable`.
#[cfg_attr(test, mockall::automock)]
pub trait LogSource {
    /// Fetch records for `area`/`vpn` in the order they were written
    fn fetch(&self, area: &str, vpn: &str) -> Result<Vec<LogRecord>, TriageError>;
}

/// Log source backed by plain-text files named `<area>_<vpn>.log`
#[derive(Debug, Clone)]
pub struct FileLogSource {
    directory: PathBuf,
}

impl FileLogSource {
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }

    /// Path of the file holding records for `area`/`vpn`
    ///
    /// # Errors
    ///
    /// Returns `TriageError::InvalidInput` if either name could escape the
    /// log directory.
    pub fn file_for(&self, area: &str, vpn: &str) -> Result<PathBuf, TriageError> {
        for (label, value) in [("area", area), ("vpn", vpn)] {
            if value.contains(['/', '\\']) || value.contains("..") {
                return Err(TriageError::InvalidInput(format!(
                    "{} '{}' contains path characters",
                    label, value
                )));
            }
        }
        Ok(self.directory.join(format!("{}_{}.log", area, vpn)))
    }

    fn read_records(path: &Path) -> Result<Vec<LogRecord>, TriageError> {
        let contents = std::fs::read(path).map_err(|e| {
            TriageError::SourceUnavailable(format!("{}: {}", path.display(), e))
        })?;
        let text = String::from_utf8_lossy(&contents);

        Ok(text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(LogRecord::from_line)
            .collect())
    }
}

impl LogSource for FileLogSource {
    fn fetch(&self, area: &str, vpn: &str) -> Result<Vec<LogRecord>, TriageError> {
        let path = self.file_for(area, vpn)?;
        info!("Reading logs for area '{}', VPN '{}' from {}", area, vpn, path.display());

        let records = Self::read_records(&path)?;
        debug!("Read {} records from {}", records.len(), path.display());
        Ok(records)
    }
}

/// Built-in records used when no log directory is configured
///
/// Mirrors what a VPN gateway typically reports: a connection, an
/// authentication failure and a latency warning.
#[derive(Debug, Clone, Default)]
pub struct SampleLogSource;

impl SampleLogSource {
    const LINES: [&'static str; 3] = [
        "2025-06-21 10:00:00 INFO - VPN-X: Conexão estabelecida.",
        "2025-06-21 10:05:15 ERROR - VPN-Y: Falha na autenticação do usuário Z.",
        "2025-06-21 10:10:30 WARNING - AREA-A: Sistema de pagamentos com latência.",
    ];
}

impl LogSource for SampleLogSource {
    fn fetch(&self, area: &str, vpn: &str) -> Result<Vec<LogRecord>, TriageError> {
        info!("Serving sample logs for area '{}', VPN '{}'", area, vpn);
        Ok(Self::LINES.iter().map(|line| LogRecord::from_line(line)).collect())
    }
}
