/// Failure pattern detection over log records
pub mod failure_detector;

pub use failure_detector::FailureDetector;
