/// Configuration file schema and loading
#[allow(clippy::module_inception)]
pub mod config;

pub use config::{
    Config, DetectorConfig, LogsConfig, ServiceConfig, ServiceManagerKind, TrackerConfig,
};
