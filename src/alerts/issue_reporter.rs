use crate::config::TrackerConfig;
use crate::error::TriageError;
use log::{error, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Issue to be filed in the tracker
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IssueRequest {
    pub title: String,
    pub body: String,
}

/// Outcome of an escalation attempt
///
/// `detail` carries the tracker's reference (issue URL) on success and a
/// diagnostic otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueResult {
    pub succeeded: bool,
    pub detail: String,
}

/// Trait for issue tracker backends
pub trait IssueTracker: Send + Sync {
    /// File `request` using `credential`, returning the created issue's reference
    fn create_issue<'a>(
        &'a self,
        credential: &'a str,
        request: &'a IssueRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, TriageError>> + Send + 'a>>;
}

/// GitHub REST backend
///
/// Posts to `{api_url}/repos/{owner}/{repo}/issues` with a bearer token.
pub struct GitHubTracker {
    client: Client,
    api_url: String,
    owner: String,
    repo: String,
}

/// Subset of the GitHub issue payload we read back
#[derive(Debug, Deserialize)]
struct CreatedIssue {
    html_url: String,
    number: u64,
}

impl GitHubTracker {
    /// Build a tracker client from configuration
    ///
    /// # Errors
    ///
    /// Returns `TriageError::NetworkFailure` if the HTTP client cannot be built.
    pub fn new(config: &TrackerConfig) -> Result<Self, TriageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("triage/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                TriageError::NetworkFailure(format!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
        })
    }

    fn issues_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/issues",
            self.api_url.trim_end_matches('/'),
            self.owner,
            self.repo
        )
    }
}

impl IssueTracker for GitHubTracker {
    fn create_issue<'a>(
        &'a self,
        credential: &'a str,
        request: &'a IssueRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, TriageError>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .client
                .post(self.issues_url())
                .bearer_auth(credential)
                .header("Accept", "application/vnd.github+json")
                .json(request)
                .send()
                .await
                .map_err(|e| TriageError::NetworkFailure(format!("HTTP request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(TriageError::NetworkFailure(format!(
                    "GitHub API returned error {}: {}",
                    status,
                    error_text.trim()
                )));
            }

            let created: CreatedIssue = response.json().await.map_err(|e| {
                TriageError::NetworkFailure(format!("Failed to parse GitHub response: {}", e))
            })?;

            info!("Created issue #{} at {}", created.number, created.html_url);
            Ok(created.html_url)
        })
    }
}

/// Escalates failures to the issue tracker
///
/// Refuses to contact the tracker when no credential is configured. Each call
/// makes at most one request; failures are never retried.
pub struct IssueReporter {
    credential: Option<String>,
    tracker: Arc<dyn IssueTracker>,
}

impl IssueReporter {
    pub fn new(credential: Option<String>, tracker: Arc<dyn IssueTracker>) -> Self {
        Self {
            credential,
            tracker,
        }
    }

    /// File an issue, reporting the outcome as an `IssueResult`
    pub fn create_issue(&self, title: &str, body: &str) -> IssueResult {
        match self.try_create_issue(title, body) {
            Ok(reference) => IssueResult {
                succeeded: true,
                detail: reference,
            },
            Err(e) => IssueResult {
                succeeded: false,
                detail: e.to_string(),
            },
        }
    }

    /// File an issue, keeping the error kind on failure
    ///
    /// # Errors
    ///
    /// Returns `TriageError::InvalidInput` for a blank title or body,
    /// `TriageError::MissingCredential` when no credential is configured, and
    /// `TriageError::NetworkFailure` for any transport or response problem.
    pub fn try_create_issue(&self, title: &str, body: &str) -> Result<String, TriageError> {
        if title.trim().is_empty() || body.trim().is_empty() {
            return Err(TriageError::InvalidInput(
                "issue title and body are required".to_string(),
            ));
        }

        let Some(credential) = self.credential.as_deref() else {
            error!("Tracker credential not configured, cannot create issues");
            return Err(TriageError::MissingCredential);
        };

        let request = IssueRequest {
            title: title.to_string(),
            body: body.to_string(),
        };

        // Single-threaded runtime scoped to this call keeps the operation synchronous
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| TriageError::NetworkFailure(format!("failed to start runtime: {}", e)))?;

        match runtime.block_on(self.tracker.create_issue(credential, &request)) {
            Ok(reference) => {
                info!("Issue '{}' created: {}", title, reference);
                Ok(reference)
            }
            Err(e) => {
                error!("Error creating issue '{}': {}", title, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Tracker double that records calls and replays a fixed response
    pub(crate) struct MockTracker {
        response: Result<String, TriageError>,
        calls: Mutex<Vec<(String, IssueRequest)>>,
    }

    impl MockTracker {
        pub(crate) fn with_response(response: Result<String, TriageError>) -> Self {
            Self {
                response,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn success() -> Self {
            Self::with_response(Ok("https://github.com/acme/ops/issues/1".to_string()))
        }

        pub(crate) fn calls(&self) -> Vec<(String, IssueRequest)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl IssueTracker for MockTracker {
        fn create_issue<'a>(
            &'a self,
            credential: &'a str,
            request: &'a IssueRequest,
        ) -> Pin<Box<dyn Future<Output = Result<String, TriageError>> + Send + 'a>> {
            Box::pin(async move {
                self.calls
                    .lock()
                    .unwrap()
                    .push((credential.to_string(), request.clone()));
                self.response.clone()
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::MockTracker;
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tracker_for(server_uri: &str) -> GitHubTracker {
        GitHubTracker::new(&TrackerConfig {
            api_url: server_uri.to_string(),
            owner: "acme".to_string(),
            repo: "ops".to_string(),
            timeout_seconds: 5,
            ..TrackerConfig::default()
        })
        .unwrap()
    }

    fn request() -> IssueRequest {
        IssueRequest {
            title: "VPN-Y authentication failures".to_string(),
            body: "Falha na autenticação do usuário Z.".to_string(),
        }
    }

    #[test]
    fn test_missing_credential_makes_no_call() {
        let tracker = Arc::new(MockTracker::success());
        let reporter = IssueReporter::new(None, tracker.clone());

        let result = reporter.create_issue("title", "body");

        assert_eq!(
            result,
            IssueResult {
                succeeded: false,
                detail: "missing credential".to_string(),
            }
        );
        assert!(tracker.calls().is_empty());
    }

    #[test]
    fn test_successful_creation_returns_reference() {
        let tracker = Arc::new(MockTracker::success());
        let reporter = IssueReporter::new(Some("tok".to_string()), tracker.clone());

        let result = reporter.create_issue("title", "body");

        assert!(result.succeeded);
        assert_eq!(result.detail, "https://github.com/acme/ops/issues/1");

        let calls = tracker.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "tok");
        assert_eq!(calls[0].1.title, "title");
        assert_eq!(calls[0].1.body, "body");
    }

    #[test]
    fn test_tracker_failure_is_reported_once() {
        let tracker = Arc::new(MockTracker::with_response(Err(
            TriageError::NetworkFailure("connection refused".to_string()),
        )));
        let reporter = IssueReporter::new(Some("tok".to_string()), tracker.clone());

        let result = reporter.create_issue("title", "body");

        assert!(!result.succeeded);
        assert!(result.detail.contains("connection refused"));
        assert_eq!(tracker.calls().len(), 1);
    }

    #[test]
    fn test_blank_fields_rejected_before_call() {
        let tracker = Arc::new(MockTracker::success());
        let reporter = IssueReporter::new(Some("tok".to_string()), tracker.clone());

        assert!(matches!(
            reporter.try_create_issue("  ", "body"),
            Err(TriageError::InvalidInput(_))
        ));
        assert!(matches!(
            reporter.try_create_issue("title", ""),
            Err(TriageError::InvalidInput(_))
        ));
        assert!(tracker.calls().is_empty());
    }

    #[test]
    fn test_issues_url_formatting() {
        let tracker = tracker_for("https://api.github.com/");
        assert_eq!(
            tracker.issues_url(),
            "https://api.github.com/repos/acme/ops/issues"
        );
    }

    #[tokio::test]
    async fn test_github_tracker_posts_issue() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/ops/issues"))
            .and(header("authorization", "Bearer tok"))
            .and(header("accept", "application/vnd.github+json"))
            .and(body_json(json!({
                "title": "VPN-Y authentication failures",
                "body": "Falha na autenticação do usuário Z."
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "number": 42,
                "html_url": "https://github.com/acme/ops/issues/42"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tracker = tracker_for(&server.uri());
        let reference = tracker.create_issue("tok", &request()).await.unwrap();

        assert_eq!(reference, "https://github.com/acme/ops/issues/42");
    }

    #[tokio::test]
    async fn test_github_tracker_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
            .expect(1)
            .mount(&server)
            .await;

        let err = tracker_for(&server.uri())
            .create_issue("bad", &request())
            .await
            .unwrap_err();

        match err {
            TriageError::NetworkFailure(detail) => {
                assert!(detail.contains("401"));
                assert!(detail.contains("Bad credentials"));
            }
            other => panic!("expected NetworkFailure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_github_tracker_malformed_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_string("not json"))
            .mount(&server)
            .await;

        let result = tracker_for(&server.uri())
            .create_issue("tok", &request())
            .await;

        assert!(matches!(result, Err(TriageError::NetworkFailure(_))));
    }

    #[tokio::test]
    async fn test_github_tracker_unreachable() {
        // Port 9 (discard) is closed on test hosts
        let result = tracker_for("http://127.0.0.1:9")
            .create_issue("tok", &request())
            .await;

        assert!(matches!(result, Err(TriageError::NetworkFailure(_))));
    }
}
