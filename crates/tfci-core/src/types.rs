//! Core type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Workflow trigger, as reported by `GITHUB_EVENT_NAME`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventName {
    /// Cron-triggered run
    Schedule,
    /// Manual dispatch
    WorkflowDispatch,
    /// Merge queue run
    MergeGroup,
    /// Pull request opened/synchronized
    PullRequest,
    /// Pull request run in the context of the base repository
    PullRequestTarget,
    /// Comment created on an issue or pull request
    IssueComment,
    /// Any other trigger, verbatim
    Other(String),
}

impl EventName {
    /// Parse an event name - zero allocation for known events
    pub fn parse(s: &str) -> Self {
        match s {
            "schedule" => Self::Schedule,
            "workflow_dispatch" => Self::WorkflowDispatch,
            "merge_group" => Self::MergeGroup,
            "pull_request" => Self::PullRequest,
            "pull_request_target" => Self::PullRequestTarget,
            "issue_comment" => Self::IssueComment,
            other => Self::Other(other.to_string()),
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &str {
        match self {
            Self::Schedule => "schedule",
            Self::WorkflowDispatch => "workflow_dispatch",
            Self::MergeGroup => "merge_group",
            Self::PullRequest => "pull_request",
            Self::PullRequestTarget => "pull_request_target",
            Self::IssueComment => "issue_comment",
            Self::Other(s) => s,
        }
    }

    /// Both pull request flavours
    #[inline]
    pub fn is_pull_request(&self) -> bool {
        matches!(self, Self::PullRequest | Self::PullRequestTarget)
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship of a comment author to the repository
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorAssociation {
    /// Repository owner
    Owner,
    /// Member of the organization that owns the repository
    Member,
    /// User with write access
    Collaborator,
    /// Previously contributed
    Contributor,
    /// First contribution to any repository
    FirstTimer,
    /// First contribution to this repository
    FirstTimeContributor,
    /// Placeholder for an imported user
    Mannequin,
    /// No relationship
    #[default]
    None,
    /// Value not known to this crate
    #[serde(other)]
    Unknown,
}

impl AuthorAssociation {
    /// Only owners and organization members may approve fork runs
    #[inline]
    pub const fn is_maintainer(&self) -> bool {
        matches!(self, Self::Owner | Self::Member)
    }

    /// Get string representation (GitHub wire form)
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "OWNER",
            Self::Member => "MEMBER",
            Self::Collaborator => "COLLABORATOR",
            Self::Contributor => "CONTRIBUTOR",
            Self::FirstTimer => "FIRST_TIMER",
            Self::FirstTimeContributor => "FIRST_TIME_CONTRIBUTOR",
            Self::Mannequin => "MANNEQUIN",
            Self::None => "NONE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for AuthorAssociation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A root configuration directory to run Terraform tests in
///
/// Serializes as `{"path":"...","name":"..."}`; `name` is the last path segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TestTarget {
    /// Directory relative to the repository root
    pub path: String,
    /// Final segment of `path`
    pub name: String,
}

/// Severity of a recoverable problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticSeverity {
    /// Informational, processing unaffected
    Warning,
    /// An item was skipped or substituted
    SoftError,
}

/// Where a recoverable problem came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCategory {
    /// Change list could not be parsed into items
    ChangeParse,
    /// A change item does not exist on disk
    MissingPath,
    /// A change item resolved to something other than a directory
    NotADirectory,
    /// A captured Terraform output file could not be read
    OutputFileRead,
}

/// A recoverable problem collected during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Severity
    pub severity: DiagnosticSeverity,
    /// Category
    pub category: DiagnosticCategory,
    /// Human readable message
    pub message: String,
}

impl Diagnostic {
    /// Shorthand for a `SoftError` diagnostic
    pub fn soft_error(category: DiagnosticCategory, message: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::SoftError,
            category,
            message: message.into(),
        }
    }

    /// Shorthand for a `Warning` diagnostic
    pub fn warning(category: DiagnosticCategory, message: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            category,
            message: message.into(),
        }
    }
}

/// Path classifier configuration
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Root whose first-level subdirectories are retested on module changes
    pub src_core: String,
    /// Directory change items are resolved against
    pub base_dir: PathBuf,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            src_core: "configurations".to_string(),
            base_dir: PathBuf::from("."),
        }
    }
}

/// Approval gate configuration
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Comment token that requests approval
    pub command: String,
    /// Jitter unit; the comment path sleeps `(run_id % 10)` of these
    pub jitter_unit: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            command: "/allow".to_string(),
            jitter_unit: Duration::from_secs(1),
        }
    }
}

/// Report formatter inputs, one field per workflow input
#[derive(Debug, Clone)]
pub struct ReportInputs {
    /// Terraform working directory (required)
    pub workdir: String,
    /// Terraform version (required)
    pub tf_version: String,
    /// Terraform platform, `{os}_{arch}` of the host by default
    pub tf_platform: String,
    /// `terraform fmt` outcome
    pub fmt_outcome: String,
    /// `terraform init` outcome
    pub init_outcome: String,
    /// `terraform validate` outcome
    pub validate_outcome: String,
    /// `terraform validate` stdout capture
    pub validate_stdout_file: String,
    /// `terraform validate` stderr capture
    pub validate_stderr_file: String,
    /// `terraform plan` outcome
    pub plan_outcome: String,
    /// `terraform plan` exit code
    pub plan_exit_code: String,
    /// `terraform plan` stdout capture
    pub plan_stdout_file: String,
    /// `terraform plan` stderr capture
    pub plan_stderr_file: String,
    /// Rendered plan (`terraform show`)
    pub plan_file: String,
    /// `terraform test` outcome
    pub test_outcome: String,
    /// `terraform test` exit code
    pub test_exit_code: String,
    /// `terraform test` stdout capture
    pub test_stdout_file: String,
    /// `terraform test` stderr capture
    pub test_stderr_file: String,
    /// Pusher shown in the footer for non pull request events
    pub owner: Option<String>,
}

/// Placeholder for outcomes and exit codes that were not supplied
pub const UNKNOWN: &str = "unknown";

impl Default for ReportInputs {
    fn default() -> Self {
        Self {
            workdir: String::new(),
            tf_version: String::new(),
            tf_platform: host_platform(),
            fmt_outcome: UNKNOWN.to_string(),
            init_outcome: UNKNOWN.to_string(),
            validate_outcome: UNKNOWN.to_string(),
            validate_stdout_file: "tfvalidate_stdout.out".to_string(),
            validate_stderr_file: "tfvalidate_stderr.out".to_string(),
            plan_outcome: UNKNOWN.to_string(),
            plan_exit_code: UNKNOWN.to_string(),
            plan_stdout_file: "tfplan_stdout.out".to_string(),
            plan_stderr_file: "tfplan_stderr.out".to_string(),
            plan_file: "tfplan.txt".to_string(),
            test_outcome: UNKNOWN.to_string(),
            test_exit_code: UNKNOWN.to_string(),
            test_stdout_file: "tftest_stdout.out".to_string(),
            test_stderr_file: "tftest_stderr.out".to_string(),
            owner: None,
        }
    }
}

/// `{os}_{arch}` of the host, in runner naming (`linux_x64`, `darwin_arm64`)
pub fn host_platform() -> String {
    let arch = match std::env::consts::ARCH {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        "x86" => "ia32",
        other => other,
    };
    let os = match std::env::consts::OS {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    };
    format!("{}_{}", os, arch)
}
