//! GitHub REST API client for issue comments, issues and pull requests

use super::models::{CreatedIssue, IssueComment, PullRequest};
use super::retry::{
    parse_retry_after, should_retry_status, should_retry_transport_error, truncate_for_error,
    RetryPolicy,
};
use crate::context::RepoRef;
use crate::error::{Error, Result};
use crate::traits::IssuesApi;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::json;

/// GitHub returns at most this many items per page
const PER_PAGE: usize = 100;

/// Safety limit to prevent infinite pagination loops
const MAX_PAGES: u32 = 1000;

/// GitHub API client bound to one repository
pub struct GitHubApiClient {
    client: reqwest::Client,
    base_url: String,
    repo: RepoRef,
    token: Option<String>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for GitHubApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubApiClient")
            .field("base_url", &self.base_url)
            .field("repo", &self.repo)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl GitHubApiClient {
    /// Create a new GitHub API client
    pub fn new(base_url: impl Into<String>, token: Option<String>, repo: RepoRef) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tfci/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            repo,
            token: token.filter(|t| !t.trim().is_empty()),
            retry: RetryPolicy::default(),
        }
    }

    /// Override the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Repository this client talks to
    pub fn repo(&self) -> &RepoRef {
        &self.repo
    }

    fn repo_url(&self, suffix: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.base_url, self.repo.owner, self.repo.name, suffix
        )
    }

    /// Send a request with retries and decode the JSON response
    ///
    /// Creates are not replayed after the server may have acted on them.
    async fn send_json<T>(
        &self,
        operation: &str,
        method: Method,
        url: &str,
        query: &[(&str, &str)],
        payload: Option<&serde_json::Value>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let mut attempt = 0_usize;
        loop {
            attempt += 1;

            let mut request = self
                .client
                .request(method.clone(), url)
                .header(reqwest::header::ACCEPT, "application/vnd.github+json")
                .header("x-github-api-version", "2022-11-28");
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = payload {
                request = request.json(body);
            }
            if let Some(ref token) = self.token {
                request = request.bearer_auth(token);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(error) => {
                    if attempt < self.retry.max_attempts
                        && should_retry_transport_error(&method, &error)
                    {
                        tracing::debug!(operation, attempt, "retrying after transport error");
                        tokio::time::sleep(self.retry.delay(attempt, None)).await;
                        continue;
                    }
                    return Err(Error::Http(format!(
                        "GitHub API {} request failed: {}",
                        operation,
                        error.without_url()
                    )));
                }
            };

            let status = response.status();
            if status.is_success() {
                return response.json::<T>().await.map_err(|e| {
                    Error::Http(format!(
                        "Failed to parse GitHub API {} response: {}",
                        operation,
                        e.without_url()
                    ))
                });
            }

            // Primary rate limit: 403 with an exhausted quota
            if status == reqwest::StatusCode::FORBIDDEN {
                let remaining = response
                    .headers()
                    .get("x-ratelimit-remaining")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("");
                if remaining == "0" {
                    return Err(Error::RateLimitExceeded(format!(
                        "GitHub API rate limit exceeded during {}. Remaining: 0.",
                        operation
                    )));
                }
            }

            let retry_after = parse_retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            if attempt < self.retry.max_attempts && should_retry_status(&method, status.as_u16()) {
                tracing::debug!(operation, attempt, status = status.as_u16(), "retrying");
                tokio::time::sleep(self.retry.delay(attempt, retry_after)).await;
                continue;
            }

            return Err(Error::Api {
                status: status.as_u16(),
                message: format!("{}: {}", operation, truncate_for_error(&body, 800)),
            });
        }
    }
}

impl IssuesApi for GitHubApiClient {
    async fn list_issue_comments(&self, issue_number: u64) -> Result<Vec<IssueComment>> {
        let url = self.repo_url(&format!("issues/{}/comments", issue_number));
        let mut comments = Vec::new();
        let mut page = 1_u32;

        loop {
            let page_value = page.to_string();
            let chunk: Vec<IssueComment> = self
                .send_json(
                    "list issue comments",
                    Method::GET,
                    &url,
                    &[("per_page", "100"), ("page", page_value.as_str())],
                    None,
                )
                .await?;

            let chunk_len = chunk.len();
            comments.extend(chunk);
            if chunk_len < PER_PAGE {
                break;
            }

            page += 1;
            if page > MAX_PAGES {
                return Err(Error::Runtime(
                    "Too many pages in GitHub API response".to_string(),
                ));
            }
        }

        tracing::debug!(issue_number, count = comments.len(), "listed issue comments");
        Ok(comments)
    }

    async fn create_issue_comment(&self, issue_number: u64, body: &str) -> Result<IssueComment> {
        let url = self.repo_url(&format!("issues/{}/comments", issue_number));
        let payload = json!({ "body": body });
        self.send_json("create issue comment", Method::POST, &url, &[], Some(&payload))
            .await
    }

    async fn update_issue_comment(&self, comment_id: u64, body: &str) -> Result<IssueComment> {
        let url = self.repo_url(&format!("issues/comments/{}", comment_id));
        let payload = json!({ "body": body });
        self.send_json("update issue comment", Method::PATCH, &url, &[], Some(&payload))
            .await
    }

    async fn create_issue(&self, title: &str, body: &str) -> Result<CreatedIssue> {
        let url = self.repo_url("issues");
        let payload = json!({ "title": title, "body": body });
        self.send_json("create issue", Method::POST, &url, &[], Some(&payload))
            .await
    }

    async fn get_pull_request(&self, number: u64) -> Result<PullRequest> {
        let url = self.repo_url(&format!("pulls/{}", number));
        self.send_json("get pull request", Method::GET, &url, &[], None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> RepoRef {
        RepoRef {
            owner: "owner".into(),
            name: "repo".into(),
        }
    }

    #[test]
    fn test_github_client_creation() {
        let client = GitHubApiClient::new("https://api.github.com/", None, repo());
        assert_eq!(client.base_url, "https://api.github.com");
        assert!(client.token.is_none());
        assert_eq!(client.retry, RetryPolicy::default());
    }

    #[test]
    fn test_blank_token_is_dropped() {
        let client = GitHubApiClient::new("https://api.github.com", Some("  ".into()), repo());
        assert!(client.token.is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = GitHubApiClient::new(
            "https://api.github.com",
            Some("ghp_secretvalue".into()),
            repo(),
        );
        let debug = format!("{:?}", client);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("ghp_secretvalue"));
    }

    #[test]
    fn test_repo_url() {
        let client = GitHubApiClient::new("https://ghe.example/api/v3", None, repo());
        assert_eq!(
            client.repo_url("issues/5/comments"),
            "https://ghe.example/api/v3/repos/owner/repo/issues/5/comments"
        );
    }
}
