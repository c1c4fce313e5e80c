//! Dispatch of the four triage operations
//!
//! The orchestrator is the only component that talks to the collaborators.
//! Both the one-shot command line and the interactive menu build an
//! `Operation` and hand it to `Orchestrator::execute`; neither carries any
//! decision logic of its own.

use crate::alerts::{GitHubTracker, IssueReporter};
use crate::collectors::{FileLogSource, LogSource, SampleLogSource};
use crate::config::Config;
use crate::error::TriageError;
use crate::events::{Failure, LogRecord};
use crate::services::{
    validate_service_name, ServiceController, ServiceState, SystemCommandRunner,
};
use crate::triggers::FailureDetector;
use log::{info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A single triage action with its validated inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    QueryLogs { area: String, vpn: String },
    QueryService { name: String },
    RestartService { name: String },
    ReportIssue { title: String, body: String },
}

fn required(label: &str, value: &str) -> Result<String, TriageError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(TriageError::InvalidInput(format!("{} is required", label)));
    }
    Ok(value.to_string())
}

impl Operation {
    pub fn query_logs(area: &str, vpn: &str) -> Result<Self, TriageError> {
        Ok(Operation::QueryLogs {
            area: required("area", area)?,
            vpn: required("vpn", vpn)?,
        })
    }

    pub fn query_service(name: &str) -> Result<Self, TriageError> {
        let name = required("service", name)?;
        validate_service_name(&name)?;
        Ok(Operation::QueryService { name })
    }

    pub fn restart_service(name: &str) -> Result<Self, TriageError> {
        let name = required("service", name)?;
        validate_service_name(&name)?;
        Ok(Operation::RestartService { name })
    }

    pub fn report_issue(title: &str, body: &str) -> Result<Self, TriageError> {
        Ok(Operation::ReportIssue {
            title: required("issue title", title)?,
            body: required("issue body", body)?,
        })
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::QueryLogs { area, vpn } => {
                write!(f, "log query for area '{}', VPN '{}'", area, vpn)
            }
            Operation::QueryService { name } => write!(f, "status check of service '{}'", name),
            Operation::RestartService { name } => write!(f, "restart of service '{}'", name),
            Operation::ReportIssue { title, .. } => write!(f, "issue report '{}'", title),
        }
    }
}

/// Records fetched for an area/VPN pair
#[derive(Debug, Clone)]
pub struct LogReport {
    pub area: String,
    pub vpn: String,
    pub records: Vec<LogRecord>,
    detector: FailureDetector,
}

impl LogReport {
    /// Failures among the fetched records, in record order
    pub fn failures(&self) -> Vec<Failure<'_>> {
        self.detector.scan(&self.records)
    }
}

/// Successful result of an operation
#[derive(Debug, Clone)]
pub enum Outcome {
    Logs(LogReport),
    ServiceStatus { name: String, state: ServiceState },
    Restarted { name: String },
    IssueCreated { title: String, reference: String },
}

/// Single entry point for triage operations
pub struct Orchestrator {
    log_source: Box<dyn LogSource>,
    detector: FailureDetector,
    services: ServiceController,
    reporter: IssueReporter,
}

impl Orchestrator {
    pub fn new(
        log_source: Box<dyn LogSource>,
        detector: FailureDetector,
        services: ServiceController,
        reporter: IssueReporter,
    ) -> Self {
        Self {
            log_source,
            detector,
            services,
            reporter,
        }
    }

    /// Wire the real collaborators described by `config`
    ///
    /// # Errors
    ///
    /// Returns `TriageError::NetworkFailure` if the tracker HTTP client cannot
    /// be built.
    pub fn from_config(config: &Config) -> Result<Self, TriageError> {
        let log_source: Box<dyn LogSource> = match &config.logs.directory {
            Some(directory) => {
                info!("Reading logs from {}", directory.display());
                Box::new(FileLogSource::new(directory.clone()))
            }
            None => {
                info!("No log directory configured, using sample records");
                Box::new(SampleLogSource)
            }
        };

        let runner = SystemCommandRunner::new(Duration::from_secs(config.service.timeout_seconds));
        let services = ServiceController::new(Box::new(runner), config.service.manager);

        let credential = config.tracker.credential();
        if credential.is_none() {
            warn!(
                "{} is not set; issue reporting is disabled",
                config.tracker.token_env
            );
        }
        let tracker = GitHubTracker::new(&config.tracker)?;
        let reporter = IssueReporter::new(credential, Arc::new(tracker));

        Ok(Self::new(
            log_source,
            FailureDetector::new(config.detector.patterns.clone()),
            services,
            reporter,
        ))
    }

    /// Run one operation to completion
    ///
    /// # Errors
    ///
    /// Returns the `TriageError` kind raised at the collaborator boundary. A
    /// service query whose state is `QueryError` or `ToolUnavailable` is
    /// reported as the matching error.
    pub fn execute(&self, operation: &Operation) -> Result<Outcome, TriageError> {
        info!("Executing {}", operation);

        match operation {
            Operation::QueryLogs { area, vpn } => {
                let records = self.log_source.fetch(area, vpn)?;
                let report = LogReport {
                    area: area.clone(),
                    vpn: vpn.clone(),
                    records,
                    detector: self.detector.clone(),
                };
                info!(
                    "Fetched {} records, {} failures",
                    report.records.len(),
                    report.failures().len()
                );
                Ok(Outcome::Logs(report))
            }
            Operation::QueryService { name } => match self.services.query(name) {
                ServiceState::QueryError(reason) => Err(TriageError::QueryError(reason)),
                ServiceState::ToolUnavailable(reason) => Err(TriageError::ToolUnavailable(reason)),
                state => Ok(Outcome::ServiceStatus {
                    name: name.clone(),
                    state,
                }),
            },
            Operation::RestartService { name } => {
                self.services.restart(name)?;
                Ok(Outcome::Restarted { name: name.clone() })
            }
            Operation::ReportIssue { title, body } => {
                let reference = self.reporter.try_create_issue(title, body)?;
                Ok(Outcome::IssueCreated {
                    title: title.clone(),
                    reference,
                })
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::alerts::issue_reporter::test_support::MockTracker;
    use crate::collectors::log_source::MockLogSource;
    use crate::config::ServiceManagerKind;
    use crate::services::runner::MockCommandRunner;

    /// Orchestrator over the given doubles
    pub(crate) fn orchestrator(
        log_source: MockLogSource,
        runner: MockCommandRunner,
        credential: Option<&str>,
        tracker: Arc<MockTracker>,
    ) -> Orchestrator {
        Orchestrator::new(
            Box::new(log_source),
            FailureDetector::default(),
            ServiceController::new(Box::new(runner), ServiceManagerKind::Powershell),
            IssueReporter::new(credential.map(str::to_string), tracker),
        )
    }

    pub(crate) fn sample_records() -> Vec<LogRecord> {
        [
            "2025-06-21 10:00:00 INFO - VPN-X: Conexão estabelecida.",
            "2025-06-21 10:05:15 ERROR - VPN-Y: Falha na autenticação do usuário Z.",
            "2025-06-21 10:10:30 WARNING - AREA-A: Sistema de pagamentos com latência.",
        ]
        .iter()
        .map(|line| LogRecord::from_line(line))
        .collect()
    }
}
