//! Text rendering and the interactive menu
//!
//! Everything the operator reads lives here. The orchestrator only returns
//! `Outcome`s and `TriageError`s.

use crate::error::TriageError;
use crate::orchestrator::{Operation, Orchestrator, Outcome};
use log::info;
use std::io::{self, BufRead, Write};

/// How much of a log query result is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Failures only
    OneShot,
    /// Fetched records followed by failures
    Interactive,
}

/// Print the result of a successful operation
pub fn render_outcome<W: Write>(
    outcome: &Outcome,
    mode: RenderMode,
    out: &mut W,
) -> io::Result<()> {
    match outcome {
        Outcome::Logs(report) => {
            if report.records.is_empty() {
                return writeln!(out, "No logs to analyze.");
            }

            if mode == RenderMode::Interactive {
                writeln!(out, "\n--- Queried logs ---")?;
                for record in &report.records {
                    writeln!(out, "{}", record)?;
                }
            }

            let failures = report.failures();
            if failures.is_empty() {
                return writeln!(out, "No failures detected in the queried logs.");
            }
            if mode == RenderMode::Interactive {
                writeln!(out, "\n--- Identified failures ---")?;
            }
            for failure in failures {
                writeln!(out, "{}", failure)?;
            }
            Ok(())
        }
        Outcome::ServiceStatus { name, state } => {
            writeln!(out, "Status of service '{}': {}", name, state)
        }
        Outcome::Restarted { name } => writeln!(out, "Restart command for '{}' sent.", name),
        Outcome::IssueCreated { title, reference } => {
            writeln!(out, "Issue '{}' created successfully: {}", title, reference)
        }
    }
}

/// Print a failed operation, naming what failed and why
pub fn render_error<W: Write>(action: &str, error: &TriageError, out: &mut W) -> io::Result<()> {
    writeln!(out, "ERROR [{}]: {}", action, error)?;
    match error {
        TriageError::RestartFailed(_) => {
            writeln!(out, "Check that you have administrator privileges.")
        }
        TriageError::MissingCredential => writeln!(
            out,
            "Set the tracker token environment variable (GITHUB_TOKEN by default) to report issues."
        ),
        _ => Ok(()),
    }
}

/// A numbered menu entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    QueryLogs,
    QueryService,
    RestartService,
    ReportIssue,
    Quit,
}

impl MenuChoice {
    /// Each number maps to exactly one entry
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuChoice::QueryLogs),
            "2" => Some(MenuChoice::QueryService),
            "3" => Some(MenuChoice::RestartService),
            "4" => Some(MenuChoice::ReportIssue),
            "5" => Some(MenuChoice::Quit),
            _ => None,
        }
    }
}

const MENU: &str = "\n\
++++++++++++++++++++++++++++++++++++++++++++++++++\n\
                 Service Monitor\n\
++++++++++++++++++++++++++++++++++++++++++++++++++\n\
1. Query logs by area/VPN\n\
2. Check service status\n\
3. Restart service\n\
4. Report failure on GitHub\n\
5. Quit\n\
++++++++++++++++++++++++++++++++++++++++++++++++++";

/// Read-evaluate loop over the four operations
///
/// Ends when the operator picks quit or input reaches end of file.
pub struct InteractiveSession<'a, R, W> {
    orchestrator: &'a Orchestrator,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> InteractiveSession<'a, R, W> {
    pub fn new(orchestrator: &'a Orchestrator, input: R, output: W) -> Self {
        Self {
            orchestrator,
            input,
            output,
        }
    }

    /// Print `prompt` and read one line, `None` at end of input
    fn prompt(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Collect the inputs for `choice`, `None` at end of input
    fn read_operation(
        &mut self,
        choice: MenuChoice,
    ) -> io::Result<Option<Result<Operation, TriageError>>> {
        let operation = match choice {
            MenuChoice::QueryLogs => {
                let Some(area) = self.prompt("Enter the area (e.g. Pagamentos): ")? else {
                    return Ok(None);
                };
                let Some(vpn) = self.prompt("Enter the VPN (e.g. Rede_Interna): ")? else {
                    return Ok(None);
                };
                Operation::query_logs(&area, &vpn)
            }
            MenuChoice::QueryService => {
                let Some(name) = self.prompt("Enter the service name (e.g. Spooler): ")? else {
                    return Ok(None);
                };
                Operation::query_service(&name)
            }
            MenuChoice::RestartService => {
                let Some(name) = self.prompt(
                    "Enter the service to restart (e.g. Spooler). \
                     WARNING: requires administrator privileges: ",
                )?
                else {
                    return Ok(None);
                };
                Operation::restart_service(&name)
            }
            MenuChoice::ReportIssue => {
                let Some(title) = self.prompt("Enter the GitHub issue title: ")? else {
                    return Ok(None);
                };
                let Some(body) = self.prompt("Enter the issue body: ")? else {
                    return Ok(None);
                };
                Operation::report_issue(&title, &body)
            }
            MenuChoice::Quit => return Ok(None),
        };
        Ok(Some(operation))
    }

    fn action_label(choice: MenuChoice) -> &'static str {
        match choice {
            MenuChoice::QueryLogs => "Log query",
            MenuChoice::QueryService => "Service status check",
            MenuChoice::RestartService => "Service restart",
            MenuChoice::ReportIssue => "Issue report",
            MenuChoice::Quit => "Quit",
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        info!("Interactive session started");

        loop {
            writeln!(self.output, "{}", MENU)?;
            let Some(line) = self.prompt("Enter your option: ")? else {
                break;
            };

            match MenuChoice::parse(&line) {
                Some(MenuChoice::Quit) => {
                    writeln!(self.output, "Exiting. See you soon!")?;
                    break;
                }
                Some(choice) => {
                    let Some(operation) = self.read_operation(choice)? else {
                        break;
                    };
                    let label = Self::action_label(choice);
                    match operation.and_then(|op| self.orchestrator.execute(&op)) {
                        Ok(outcome) => {
                            render_outcome(&outcome, RenderMode::Interactive, &mut self.output)?
                        }
                        Err(e) => render_error(label, &e, &mut self.output)?,
                    }
                }
                None => writeln!(self.output, "Invalid option. Please try again.")?,
            }

            if self.prompt("Press Enter to continue...")?.is_none() {
                break;
            }
        }

        info!("Interactive session finished");
        Ok(())
    }
}
