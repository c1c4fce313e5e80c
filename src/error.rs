use thiserror::Error;

/// Errors that can occur while running a triage operation
///
/// Every collaborator boundary (log source, service manager process, tracker
/// HTTP call) converts its own faults into one of these kinds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TriageError {
    #[error("Log source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Service manager tool not found: {0}")]
    ToolUnavailable(String),

    #[error("Service query failed: {0}")]
    QueryError(String),

    #[error("Service restart failed: {0}")]
    RestartFailed(String),

    #[error("missing credential")]
    MissingCredential,

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl TriageError {
    /// Process exit code reported by the one-shot command line for this kind
    pub fn exit_code(&self) -> i32 {
        match self {
            TriageError::InvalidInput(_) => 2,
            TriageError::SourceUnavailable(_) => 3,
            TriageError::ToolUnavailable(_) => 4,
            TriageError::QueryError(_) => 5,
            TriageError::RestartFailed(_) => 6,
            TriageError::MissingCredential => 7,
            TriageError::NetworkFailure(_) => 8,
        }
    }
}

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}
