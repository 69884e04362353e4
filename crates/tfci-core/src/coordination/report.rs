//! Report publishing: one issue per scheduled failure, one comment per
//! working directory on pull requests

use crate::context::Context;
use crate::error::{Error, Result};
use crate::http::models::IssueComment;
use crate::output::report::TerraformReport;
use crate::traits::IssuesApi;
use crate::types::EventName;

/// What the publisher did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Scheduled run: a new issue was opened
    CreatedIssue {
        /// Issue number
        number: u64,
        /// Browser URL, when returned
        url: Option<String>,
    },
    /// Pull request: the existing report comment was replaced
    UpdatedComment {
        /// Comment id
        id: u64,
    },
    /// Pull request: no report comment yet, one was added
    CreatedComment {
        /// Comment id
        id: u64,
    },
    /// Event that gets no report
    Skipped,
}

/// Bot comment previously posted for the same working directory
pub fn find_report_comment<'c>(
    comments: &'c [IssueComment],
    report: &TerraformReport,
) -> Option<&'c IssueComment> {
    let marker = report.workdir_marker();
    comments
        .iter()
        .find(|c| c.user.is_bot() && c.body.contains(&marker))
}

/// Posts a rendered report through an issues API
pub struct ReportPublisher<'a, A> {
    api: &'a A,
}

impl<'a, A: IssuesApi> ReportPublisher<'a, A> {
    /// Create a publisher
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Create or update the issue/comment for this event
    pub async fn publish(&self, report: &TerraformReport, ctx: &Context) -> Result<PublishOutcome> {
        match &ctx.event_name {
            EventName::Schedule => {
                let issue = self
                    .api
                    .create_issue(&report.issue_title(), &report.issue_body())
                    .await?;
                tracing::info!(number = issue.number, "created failure issue");
                Ok(PublishOutcome::CreatedIssue {
                    number: issue.number,
                    url: issue.html_url,
                })
            }
            event if event.is_pull_request() => {
                let number = ctx.issue_number().ok_or_else(|| {
                    Error::EventParse("pull request number missing from event payload".to_string())
                })?;
                self.upsert_comment(number, report).await
            }
            event => {
                tracing::info!(event = %event, "no report posted for this event");
                Ok(PublishOutcome::Skipped)
            }
        }
    }

    async fn upsert_comment(&self, number: u64, report: &TerraformReport) -> Result<PublishOutcome> {
        let comments = self.api.list_issue_comments(number).await?;
        let body = report.body();

        match find_report_comment(&comments, report) {
            Some(existing) => {
                self.api.update_issue_comment(existing.id, &body).await?;
                tracing::info!(comment_id = existing.id, number, "updated report comment");
                Ok(PublishOutcome::UpdatedComment { id: existing.id })
            }
            None => {
                let created = self.api.create_issue_comment(number, &body).await?;
                tracing::info!(comment_id = created.id, number, "created report comment");
                Ok(PublishOutcome::CreatedComment { id: created.id })
            }
        }
    }
}
