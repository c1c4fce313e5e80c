/// Log sources for area/VPN records
pub mod log_source;

pub use log_source::{FileLogSource, LogSource, SampleLogSource};
