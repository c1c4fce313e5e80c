use log::{debug, warn};
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// How often a running child is polled for exit
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captured result of a finished process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Errors raised before a process produced an exit status
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("failed to start {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    #[error("IO error: {0}")]
    Io(String),
}

/// Process boundary used to drive the service manager
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner {
    /// Run `program` with `args` to completion and capture its output
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, RunError>;
}

/// Runs real subprocesses, killing any that outlive the timeout
#[derive(Debug, Clone)]
pub struct SystemCommandRunner {
    timeout: Duration,
}

impl SystemCommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
        pipe.map(|mut pipe| {
            thread::spawn(move || {
                let mut buffer = Vec::new();
                if let Err(e) = pipe.read_to_end(&mut buffer) {
                    debug!("Failed to read child pipe: {}", e);
                }
                buffer
            })
        })
    }

    fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
        let bytes = handle
            .map(|h| h.join().unwrap_or_default())
            .unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl CommandRunner for SystemCommandRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, RunError> {
        debug!("Running {} {:?}", program, args);

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => RunError::NotFound(program.to_string()),
                _ => RunError::Spawn {
                    program: program.to_string(),
                    reason: e.to_string(),
                },
            })?;

        // Pipes are drained concurrently so a chatty child cannot block on a full buffer
        let stdout = Self::drain(child.stdout.take());
        let stderr = Self::drain(child.stderr.take());

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    warn!("{} exceeded {:?}, killing it", program, self.timeout);
                    if let Err(e) = child.kill() {
                        warn!("Failed to kill {}: {}", program, e);
                    }
                    let _ = child.wait();
                    return Err(RunError::TimedOut(self.timeout));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(RunError::Io(e.to_string())),
            }
        };

        Ok(CommandOutput {
            code: status.code(),
            stdout: Self::collect(stdout),
            stderr: Self::collect(stderr),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner() -> SystemCommandRunner {
        SystemCommandRunner::new(Duration::from_secs(5))
    }

    #[test]
    fn test_missing_program_is_not_found() {
        let result = runner().run("definitely-not-a-real-tool-4711", &[]);
        assert_eq!(
            result,
            Err(RunError::NotFound("definitely-not-a-real-tool-4711".to_string()))
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_captures_stdout_and_exit_code() {
        let output = runner()
            .run("sh", &["-c".to_string(), "echo Running; exit 0".to_string()])
            .unwrap();

        assert!(output.success());
        assert_eq!(output.stdout.trim(), "Running");
        assert!(output.stderr.is_empty());
    }

    #[test]
    #[cfg(unix)]
    fn test_captures_stderr_on_failure() {
        let output = runner()
            .run("sh", &["-c".to_string(), "echo denied >&2; exit 3".to_string()])
            .unwrap();

        assert!(!output.success());
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stderr.trim(), "denied");
    }

    #[test]
    #[cfg(unix)]
    fn test_timeout_kills_child() {
        let runner = SystemCommandRunner::new(Duration::from_millis(200));
        let started = Instant::now();

        let result = runner.run("sleep", &["5".to_string()]);

        assert_eq!(result, Err(RunError::TimedOut(Duration::from_millis(200))));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
