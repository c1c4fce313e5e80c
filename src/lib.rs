/// Error types for the triage pipeline
pub mod error;

/// Log record and failure types
pub mod events;

/// Log sources for area/VPN records
pub mod collectors;

/// Failure pattern detection
pub mod triggers;

/// Service manager control
pub mod services;

/// Issue tracker escalation
pub mod alerts;

/// Configuration management
pub mod config;

/// Operation dispatch
pub mod orchestrator;

/// Operator-facing rendering and the interactive menu
pub mod console;

// Re-export commonly used types
pub use error::{ConfigError, TriageError};
pub use orchestrator::{Operation, Orchestrator, Outcome};
