use anyhow::Context;
use clap::{Parser, ValueEnum};
use log::{error, info, warn};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use triage::config::Config;
use triage::console::{render_error, render_outcome, InteractiveSession, RenderMode};
use triage::error::ConfigError;
use triage::{Operation, Orchestrator, TriageError};

/// One-shot actions selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Action {
    /// Scan the logs of an area/VPN pair for failures
    #[value(name = "consultar_logs")]
    ConsultarLogs,
    /// Query the status of a service
    #[value(name = "verificar_servico")]
    VerificarServico,
    /// Restart a service (requires administrator privileges)
    #[value(name = "reiniciar_servico")]
    ReiniciarServico,
    /// File a GitHub issue
    #[value(name = "relatar_falha")]
    RelatarFalha,
}

impl Action {
    fn as_str(self) -> &'static str {
        match self {
            Action::ConsultarLogs => "consultar_logs",
            Action::VerificarServico => "verificar_servico",
            Action::ReiniciarServico => "reiniciar_servico",
            Action::RelatarFalha => "relatar_falha",
        }
    }
}

/// Command-line arguments for the triage tool
#[derive(Parser, Debug)]
#[command(
    name = "triage",
    about = "Service monitoring and management tool for on-call triage",
    long_about = "Inspects area/VPN logs for failures, checks and restarts services, and \
                  reports failures as GitHub issues. Runs a single action when --action is \
                  given, otherwise starts an interactive menu."
)]
struct Cli {
    /// Action to run once before exiting
    #[arg(long, value_enum)]
    action: Option<Action>,

    /// Area to query logs for
    #[arg(long)]
    area: Option<String>,

    /// VPN to query logs for
    #[arg(long)]
    vpn: Option<String>,

    /// Service name to check or restart
    #[arg(long)]
    service: Option<String>,

    /// Title of the GitHub issue
    #[arg(long = "issue_title")]
    issue_title: Option<String>,

    /// Body of the GitHub issue
    #[arg(long = "issue_body")]
    issue_body: Option<String>,

    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Configuration file path (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Append diagnostic logs to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose logging output (debug level)")]
    verbose: bool,
}

impl Cli {
    /// Validate the CLI arguments
    fn validate(&self) -> Result<(), String> {
        if let Some(ref config_path) = self.config {
            // Missing files fall back to defaults in load_config
            if config_path.exists() && !config_path.is_file() {
                return Err(format!(
                    "Configuration path is not a file: {}",
                    config_path.display()
                ));
            }
        }
        Ok(())
    }

    /// Operation selected by `--action`, validated against its flags
    fn operation(&self) -> Option<(Action, Result<Operation, TriageError>)> {
        let action = self.action?;
        let value = |flag: &Option<String>| flag.clone().unwrap_or_default();

        let operation = match action {
            Action::ConsultarLogs => Operation::query_logs(&value(&self.area), &value(&self.vpn)),
            Action::VerificarServico => Operation::query_service(&value(&self.service)),
            Action::ReiniciarServico => Operation::restart_service(&value(&self.service)),
            Action::RelatarFalha => {
                Operation::report_issue(&value(&self.issue_title), &value(&self.issue_body))
            }
        };
        Some((action, operation))
    }
}

/// Load configuration from file or use defaults
fn load_config(config_path: Option<&Path>) -> Config {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            match Config::from_file(path) {
                Ok(config) => config,
                Err(ConfigError::ReadError(e)) => {
                    warn!("Configuration file not found or unreadable ({}), using defaults", e);
                    Config::default()
                }
                Err(e) => {
                    error!("Configuration error in '{}': {}", path.display(), e);
                    warn!("Using default configuration due to invalid config file");
                    Config::default()
                }
            }
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    }
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    // Without a log file, stay quiet on stderr so the menu stays readable
    let default_filter = if cli.log_file.is_some() { "info" } else { "warn" };
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter),
    );
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    if let Some(ref path) = cli.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

/// Run a single operation and return the process exit code
fn run_one_shot<W: Write>(
    orchestrator: &Orchestrator,
    action: Action,
    operation: Result<Operation, TriageError>,
    out: &mut W,
) -> io::Result<i32> {
    match operation.and_then(|op| orchestrator.execute(&op)) {
        Ok(outcome) => {
            render_outcome(&outcome, RenderMode::OneShot, out)?;
            Ok(0)
        }
        Err(e) => {
            error!("Action {} failed: {}", action.as_str(), e);
            render_error(action.as_str(), &e, out)?;
            Ok(e.exit_code())
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<i32> {
    cli.validate().map_err(anyhow::Error::msg)?;

    let config = load_config(cli.config.as_deref());
    let orchestrator =
        Orchestrator::from_config(&config).context("failed to initialize triage components")?;

    match cli.operation() {
        Some((action, operation)) => {
            let mut stdout = io::stdout().lock();
            let code = run_one_shot(&orchestrator, action, operation, &mut stdout)
                .context("failed to write result")?;
            Ok(code)
        }
        None => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            InteractiveSession::new(&orchestrator, stdin.lock(), stdout.lock())
                .run()
                .context("interactive session failed")?;
            Ok(0)
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("ERROR: {:#}", e);
        std::process::exit(1);
    }

    info!("Program started");

    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("ERROR: {:#}", e);
            1
        }
    };

    info!("Program finished with exit code {}", code);
    std::process::exit(code);
}
