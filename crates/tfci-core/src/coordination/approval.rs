//! Approval gate for fork pull requests
//!
//! Tests on fork pull requests only run once a maintainer (`OWNER` or
//! `MEMBER`) has commented the approval command. The approval is recorded as
//! a comment carrying `<!-- APPROVAL_MARKER:{sha} -->`; a later
//! `pull_request` event for the same head commit finds that comment and lets
//! the run through. A new push changes the SHA and needs a new approval.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::http::models::{IssueComment, PullRequest};
use crate::traits::IssuesApi;
use crate::types::{AuthorAssociation, EventName, GateConfig};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use std::time::Duration;

/// Marker prefix; the head SHA follows
pub const MARKER_PREFIX: &str = "APPROVAL_MARKER:";

/// `APPROVAL_MARKER:{sha}`
#[inline]
pub fn approval_marker(sha: &str) -> String {
    format!("{}{}", MARKER_PREFIX, sha)
}

/// A maintainer comment carrying the marker for `sha`
pub fn is_qualifying_approval(comment: &IssueComment, sha: &str) -> bool {
    comment.author_association.is_maintainer() && comment.body.contains(&approval_marker(sha))
}

/// An approval for `sha` already on record: a qualifying approval, or one
/// this gate posted itself through a bot account
///
/// Only used to avoid posting twice; `pull_request` runs still require
/// [`is_qualifying_approval`].
pub fn is_recorded_approval(comment: &IssueComment, sha: &str) -> bool {
    is_qualifying_approval(comment, sha)
        || (comment.user.is_bot() && comment.body.contains(&approval_marker(sha)))
}

/// Reply to a non-maintainer approval attempt
pub fn rejection_message(login: &str, association: AuthorAssociation) -> String {
    format!(
        "@{} - Sorry, only maintainers can approve tests on fork PRs. Required: MEMBER or OWNER. Current: {}",
        login, association
    )
}

/// Approval comment recording `sha` as approved by `login`
pub fn approval_comment_body(login: &str, sha: &str, approved_at: DateTime<Utc>) -> String {
    [
        "## ✅ Test Approved".to_string(),
        String::new(),
        format!(
            "@{} has approved running terraform tests for commit `{}`.",
            login, sha
        ),
        String::new(),
        "**Approval Details:**".to_string(),
        format!("- Commit SHA: `{}`", sha),
        format!("- Approved by: @{}", login),
        format!(
            "- Approved at: {}",
            approved_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        ),
        String::new(),
        "**Important:** If new commits are pushed, tests will need to be re-approved.".to_string(),
        String::new(),
        format!("<!-- {} -->", approval_marker(sha)),
    ]
    .join("\n")
}

/// Delay before the comment path reads the comment list
///
/// `(last two digits of the run id) % 10` units, so that concurrent runs
/// triggered by the same comment are spread out.
#[inline]
pub fn jitter_delay(run_id: u64, unit: Duration) -> Duration {
    let slot = ((run_id % 100) % 10) as u32;
    unit * slot
}

/// Why the gate decided the way it did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    /// `schedule` runs always test
    Scheduled,
    /// `workflow_dispatch` runs always test
    ManualDispatch,
    /// Merge queue runs execute in the base repository
    MergeQueue,
    /// Pull request from a branch of the same repository
    SameRepository,
    /// Fork pull request with a maintainer approval for the head commit
    Approved,
    /// Fork pull request without an approval for the head commit
    AwaitingApproval,
    /// Comment on a plain issue
    NotAPullRequest,
    /// Comment without the approval command
    NoCommand,
    /// Approval command from someone who may not approve
    NotMaintainer,
    /// Approval command from a maintainer
    ApprovalRecorded,
    /// Event the gate does not handle
    UnsupportedEvent,
}

impl DecisionReason {
    /// Get string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled run",
            Self::ManualDispatch => "manual dispatch",
            Self::MergeQueue => "merge queue",
            Self::SameRepository => "internal pull request",
            Self::Approved => "maintainer approval found",
            Self::AwaitingApproval => "fork pull request awaiting approval",
            Self::NotAPullRequest => "comment is not on a pull request",
            Self::NoCommand => "comment does not contain the approval command",
            Self::NotMaintainer => "commenter is not a maintainer",
            Self::ApprovalRecorded => "approval recorded",
            Self::UnsupportedEvent => "unsupported event",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gate result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalDecision {
    /// Whether downstream tests should execute
    pub should_run: bool,
    /// Why
    pub reason: DecisionReason,
}

impl ApprovalDecision {
    #[inline]
    fn run(reason: DecisionReason) -> Self {
        Self {
            should_run: true,
            reason,
        }
    }

    #[inline]
    fn skip(reason: DecisionReason) -> Self {
        Self {
            should_run: false,
            reason,
        }
    }
}

/// Decides whether Terraform tests run for an event
pub struct ApprovalGate<'a, A> {
    api: &'a A,
    config: &'a GateConfig,
}

impl<'a, A: IssuesApi> ApprovalGate<'a, A> {
    /// Create a gate over an issues API
    pub fn new(api: &'a A, config: &'a GateConfig) -> Self {
        Self { api, config }
    }

    /// Decide for the event in `ctx`, posting approval or rejection comments
    /// where the event calls for it
    pub async fn decide(&self, ctx: &Context) -> Result<ApprovalDecision> {
        tracing::info!(event = %ctx.event_name, "evaluating approval gate");

        let decision = match &ctx.event_name {
            EventName::Schedule => ApprovalDecision::run(DecisionReason::Scheduled),
            EventName::WorkflowDispatch => ApprovalDecision::run(DecisionReason::ManualDispatch),
            EventName::MergeGroup => match ctx.payload.pull_request.as_ref() {
                Some(pr) => self.check_pull_request(pr).await?,
                None => ApprovalDecision::run(DecisionReason::MergeQueue),
            },
            EventName::PullRequest => {
                let pr = ctx.payload.pull_request.as_ref().ok_or_else(|| {
                    Error::EventParse("pull_request missing from event payload".to_string())
                })?;
                self.check_pull_request(pr).await?
            }
            EventName::IssueComment => self.handle_comment(ctx).await?,
            _ => ApprovalDecision::skip(DecisionReason::UnsupportedEvent),
        };

        tracing::info!(
            should_run = decision.should_run,
            reason = %decision.reason,
            "approval gate decided"
        );
        Ok(decision)
    }

    /// `pull_request`: same-repository PRs run, forks need an approval
    async fn check_pull_request(&self, pr: &PullRequest) -> Result<ApprovalDecision> {
        let is_fork = pr.is_fork();
        tracing::info!(
            number = pr.number,
            head = pr.head_repo_name(),
            base = pr.base_repo_name(),
            is_fork,
            sha = %pr.head.sha,
            "checking pull request"
        );

        if !is_fork {
            return Ok(ApprovalDecision::run(DecisionReason::SameRepository));
        }

        let comments = self.api.list_issue_comments(pr.number).await?;
        let approval = comments
            .iter()
            .find(|c| is_qualifying_approval(c, &pr.head.sha));

        match approval {
            Some(c) => {
                tracing::info!(comment_id = c.id, approver = %c.user.login, "approval found");
                Ok(ApprovalDecision::run(DecisionReason::Approved))
            }
            None => Ok(ApprovalDecision::skip(DecisionReason::AwaitingApproval)),
        }
    }

    /// `issue_comment`: record an approval or reject the attempt
    async fn handle_comment(&self, ctx: &Context) -> Result<ApprovalDecision> {
        let issue =
            ctx.payload.issue.as_ref().ok_or_else(|| {
                Error::EventParse("issue missing from event payload".to_string())
            })?;
        if !issue.is_pull_request() {
            return Ok(ApprovalDecision::skip(DecisionReason::NotAPullRequest));
        }

        let comment = ctx.payload.comment.as_ref().ok_or_else(|| {
            Error::EventParse("comment missing from event payload".to_string())
        })?;
        if !comment.body.contains(&self.config.command) {
            return Ok(ApprovalDecision::skip(DecisionReason::NoCommand));
        }

        let delay = jitter_delay(ctx.run_id, self.config.jitter_unit);
        tracing::info!(delay_ms = delay.as_millis() as u64, "delaying before comment checks");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let commenter = comment.user.login.as_str();
        let association = comment.author_association;
        tracing::info!(
            commenter,
            association = %association,
            maintainer = association.is_maintainer(),
            "approval command received"
        );

        if !association.is_maintainer() {
            let rejection = rejection_message(commenter, association);
            let comments = self.api.list_issue_comments(issue.number).await?;
            if comments.iter().any(|c| c.body.contains(&rejection)) {
                tracing::debug!("rejection already posted");
            } else {
                self.api
                    .create_issue_comment(issue.number, &rejection)
                    .await?;
            }
            return Ok(ApprovalDecision::skip(DecisionReason::NotMaintainer));
        }

        let pr = self.api.get_pull_request(issue.number).await?;
        tracing::info!(
            number = pr.number,
            head = pr.head_repo_name(),
            base = pr.base_repo_name(),
            is_fork = pr.is_fork(),
            sha = %pr.head.sha,
            "approving pull request"
        );

        let comments = self.api.list_issue_comments(issue.number).await?;
        if comments
            .iter()
            .any(|c| is_recorded_approval(c, &pr.head.sha))
        {
            tracing::info!(sha = %pr.head.sha, "commit already approved");
        } else {
            let body = approval_comment_body(commenter, &pr.head.sha, Utc::now());
            self.api.create_issue_comment(issue.number, &body).await?;
        }

        Ok(ApprovalDecision::run(DecisionReason::ApprovalRecorded))
    }
}
