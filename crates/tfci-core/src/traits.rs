//! Trait seam over the GitHub issue / pull request API
//!
//! The gate and the report publisher are generic over this trait and run
//! against [`crate::http::GitHubApiClient`] in production.

use crate::error::Result;
use crate::http::models::{CreatedIssue, IssueComment, PullRequest};
use std::future::Future;

/// Issue, comment and pull request operations for one repository
pub trait IssuesApi {
    /// All comments on an issue or pull request, oldest first
    fn list_issue_comments(
        &self,
        issue_number: u64,
    ) -> impl Future<Output = Result<Vec<IssueComment>>> + Send;

    /// Add a comment to an issue or pull request
    fn create_issue_comment(
        &self,
        issue_number: u64,
        body: &str,
    ) -> impl Future<Output = Result<IssueComment>> + Send;

    /// Replace the body of an existing comment
    fn update_issue_comment(
        &self,
        comment_id: u64,
        body: &str,
    ) -> impl Future<Output = Result<IssueComment>> + Send;

    /// Open a new issue
    fn create_issue(
        &self,
        title: &str,
        body: &str,
    ) -> impl Future<Output = Result<CreatedIssue>> + Send;

    /// Fetch a pull request by number
    fn get_pull_request(&self, number: u64) -> impl Future<Output = Result<PullRequest>> + Send;
}
