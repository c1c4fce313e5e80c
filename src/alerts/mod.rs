/// Escalation of failures to the issue tracker
pub mod issue_reporter;

pub use issue_reporter::{GitHubTracker, IssueReporter, IssueRequest, IssueResult, IssueTracker};
