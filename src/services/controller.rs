use crate::config::ServiceManagerKind;
use crate::error::TriageError;
use crate::services::runner::{CommandOutput, CommandRunner, RunError};
use log::{error, info, warn};
use std::fmt;

/// Point-in-time state of a service as reported by the service manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceState {
    Running,
    Stopped,
    /// The manager answered, but with neither a running nor a stopped status
    Unknown,
    /// The manager ran and reported a failure
    QueryError(String),
    /// The manager itself could not be located or started
    ToolUnavailable(String),
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceState::Running => f.write_str("Running"),
            ServiceState::Stopped => f.write_str("Stopped"),
            ServiceState::Unknown => f.write_str("Unknown"),
            ServiceState::QueryError(reason) => write!(f, "Query error: {}", reason),
            ServiceState::ToolUnavailable(reason) => {
                write!(f, "Service manager unavailable: {}", reason)
            }
        }
    }
}

impl ServiceState {
    /// Classify service manager output by case-insensitive keyword
    pub fn classify(output: &str) -> Self {
        let output = output.to_lowercase();
        if output.contains("running") {
            ServiceState::Running
        } else if output.contains("stopped") {
            ServiceState::Stopped
        } else {
            ServiceState::Unknown
        }
    }
}

/// Characters PowerShell accepts as single-quote delimiters
const SINGLE_QUOTES: &[char] = &['\'', '\u{2018}', '\u{2019}', '\u{201A}', '\u{201B}'];

/// Quote `value` as a PowerShell verbatim string
///
/// Single-quoted strings perform no `$` or backtick expansion. Embedded quote
/// characters are doubled, which PowerShell reads as a literal quote.
fn powershell_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if SINGLE_QUOTES.contains(&c) {
            quoted.push(c);
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// Reject service names that cannot be passed safely to the manager
///
/// # Errors
///
/// Returns `TriageError::InvalidInput` for empty names, names containing
/// double quotes or control characters, and names that look like
/// command-line flags.
pub fn validate_service_name(name: &str) -> Result<(), TriageError> {
    if name.trim().is_empty() {
        return Err(TriageError::InvalidInput(
            "service name is required".to_string(),
        ));
    }
    if name.contains('"') || name.chars().any(char::is_control) {
        return Err(TriageError::InvalidInput(format!(
            "service name '{}' contains forbidden characters",
            name.escape_default()
        )));
    }
    if name.starts_with('-') {
        return Err(TriageError::InvalidInput(format!(
            "service name '{}' must not start with '-'",
            name
        )));
    }
    Ok(())
}

/// Queries and restarts named services through the platform service manager
///
/// The controller holds no state between calls. It never escalates privilege;
/// a restart without sufficient rights fails in the underlying tool and is
/// reported as `RestartFailed`.
pub struct ServiceController {
    runner: Box<dyn CommandRunner>,
    manager: ServiceManagerKind,
}

impl ServiceController {
    pub fn new(runner: Box<dyn CommandRunner>, manager: ServiceManagerKind) -> Self {
        Self { runner, manager }
    }

    /// Name of the service manager executable
    pub fn tool(&self) -> &'static str {
        match self.manager {
            ServiceManagerKind::Powershell => "powershell.exe",
            ServiceManagerKind::Systemctl => "systemctl",
        }
    }

    fn status_args(&self, name: &str) -> Vec<String> {
        match self.manager {
            ServiceManagerKind::Powershell => vec![
                "-command".to_string(),
                format!(
                    "Get-Service -Name {} | Select-Object Status",
                    powershell_literal(name)
                ),
            ],
            ServiceManagerKind::Systemctl => vec![
                "show".to_string(),
                "--property=LoadState,SubState".to_string(),
                name.to_string(),
            ],
        }
    }

    fn restart_args(&self, name: &str) -> Vec<String> {
        match self.manager {
            ServiceManagerKind::Powershell => vec![
                "-command".to_string(),
                format!("Restart-Service -Name {} -Force", powershell_literal(name)),
            ],
            ServiceManagerKind::Systemctl => vec!["restart".to_string(), name.to_string()],
        }
    }

    /// Reduce manager output to the status text to classify
    ///
    /// `systemctl show` exits zero for units that do not exist, reporting
    /// `LoadState=not-found`. A stopped unit's sub-state is `dead`.
    fn normalize_status(&self, stdout: &str) -> Result<String, String> {
        match self.manager {
            ServiceManagerKind::Powershell => Ok(stdout.trim().to_string()),
            ServiceManagerKind::Systemctl => {
                let property = |key: &str| {
                    stdout.lines().find_map(|line| {
                        line.trim()
                            .split_once('=')
                            .filter(|(k, _)| *k == key)
                            .map(|(_, v)| v.trim())
                    })
                };

                if property("LoadState") == Some("not-found") {
                    return Err("unit not found".to_string());
                }
                match property("SubState") {
                    Some(sub) if sub.eq_ignore_ascii_case("dead") => Ok("stopped".to_string()),
                    Some(sub) => Ok(sub.to_string()),
                    None => Ok(String::new()),
                }
            }
        }
    }

    fn failure_detail(output: &CommandOutput) -> String {
        let stderr = output.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match output.code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }

    /// Query the current state of `name`
    pub fn query(&self, name: &str) -> ServiceState {
        if let Err(e) = validate_service_name(name) {
            return ServiceState::QueryError(e.to_string());
        }

        let program = self.tool();
        match self.runner.run(program, &self.status_args(name)) {
            Ok(output) if output.success() => match self.normalize_status(&output.stdout) {
                Ok(status) => {
                    let state = ServiceState::classify(&status);
                    info!("Service '{}' status: {}", name, state);
                    state
                }
                Err(detail) => {
                    error!("Error checking status of service '{}': {}", name, detail);
                    ServiceState::QueryError(detail)
                }
            },
            Ok(output) => {
                let detail = Self::failure_detail(&output);
                error!("Error checking status of service '{}': {}", name, detail);
                ServiceState::QueryError(detail)
            }
            Err(e @ (RunError::NotFound(_) | RunError::Spawn { .. })) => {
                error!("Cannot invoke {} to query '{}': {}", program, name, e);
                ServiceState::ToolUnavailable(e.to_string())
            }
            Err(e) => {
                error!("Unexpected error checking service '{}': {}", name, e);
                ServiceState::QueryError(e.to_string())
            }
        }
    }

    /// Restart `name`, succeeding only if the manager exits zero
    ///
    /// The effect is not re-verified; callers may follow up with `query`.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::ToolUnavailable` if the manager cannot be invoked,
    /// `TriageError::RestartFailed` on a non-zero exit or timeout, and
    /// `TriageError::InvalidInput` for a malformed name.
    pub fn restart(&self, name: &str) -> Result<(), TriageError> {
        validate_service_name(name)?;
        info!("Attempting to restart service: {}", name);

        let program = self.tool();
        match self.runner.run(program, &self.restart_args(name)) {
            Ok(output) if output.success() => {
                info!(
                    "Service '{}' restarted successfully: {}",
                    name,
                    output.stdout.trim()
                );
                Ok(())
            }
            Ok(output) => {
                let detail = Self::failure_detail(&output);
                error!("Error restarting service '{}': {}", name, detail);
                Err(TriageError::RestartFailed(detail))
            }
            Err(e @ (RunError::NotFound(_) | RunError::Spawn { .. })) => {
                error!("Cannot invoke {} to restart '{}': {}", program, name, e);
                Err(TriageError::ToolUnavailable(e.to_string()))
            }
            Err(e) => {
                warn!("Unexpected error restarting service '{}': {}", name, e);
                Err(TriageError::RestartFailed(e.to_string()))
            }
        }
    }
}
