/// Service manager control through a process boundary
pub mod controller;
pub mod runner;

pub use controller::{validate_service_name, ServiceController, ServiceState};
pub use runner::{CommandOutput, CommandRunner, RunError, SystemCommandRunner};
