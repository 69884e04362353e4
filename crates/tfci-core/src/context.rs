//! Workflow run context loaded from the GitHub Actions environment

use crate::error::{Error, Result};
use crate::http::models::{Issue, IssueComment, PullRequest};
use crate::types::EventName;
use serde::Deserialize;
use std::path::Path;

/// Repository coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    /// Owner (user or organization)
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepoRef {
    /// Parse `owner/repo`
    pub fn parse(full_name: &str) -> Result<Self> {
        match full_name.trim().split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(Error::Config(format!(
                "Invalid GITHUB_REPOSITORY format: {}",
                full_name
            ))),
        }
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// The subset of the webhook payload this crate reads
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPayload {
    /// `pull_request` / `pull_request_target` events
    #[serde(default)]
    pub pull_request: Option<PullRequest>,
    /// `issue_comment` events
    #[serde(default)]
    pub issue: Option<Issue>,
    /// `issue_comment` events
    #[serde(default)]
    pub comment: Option<IssueComment>,
    /// `workflow_dispatch` inputs
    #[serde(default)]
    pub inputs: Option<serde_json::Map<String, serde_json::Value>>,
}

impl EventPayload {
    /// A `workflow_dispatch` input rendered as a string
    ///
    /// Booleans and numbers are stringified; absent or `null` gives `None`.
    pub fn input(&self, name: &str) -> Option<String> {
        match self.inputs.as_ref()?.get(name)? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// One workflow run
#[derive(Debug, Clone)]
pub struct Context {
    /// Triggering event
    pub event_name: EventName,
    /// Repository the workflow runs in
    pub repo: RepoRef,
    /// Numeric run id (`GITHUB_RUN_ID`)
    pub run_id: u64,
    /// Web base URL (`GITHUB_SERVER_URL`)
    pub server_url: String,
    /// REST base URL (`GITHUB_API_URL`)
    pub api_url: String,
    /// User that triggered the run (`GITHUB_ACTOR`)
    pub actor: String,
    /// Workflow name (`GITHUB_WORKFLOW`)
    pub workflow: String,
    /// Parsed webhook payload
    pub payload: EventPayload,
}

impl Context {
    /// Build from the standard Actions environment variables
    ///
    /// `GITHUB_EVENT_NAME` and `GITHUB_REPOSITORY` are required; a missing
    /// `GITHUB_EVENT_PATH` yields an empty payload.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Like [`Context::from_env`] but only the event is required
    ///
    /// For steps that never call the API; the repository stays empty when
    /// `GITHUB_REPOSITORY` is unset or malformed.
    pub fn event_from_env() -> Result<Self> {
        Self::event_from_vars(|name| std::env::var(name).ok())
    }

    /// [`Context::from_env`] over an arbitrary variable lookup
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut ctx = Self::event_from_vars(&var)?;
        let repository = var("GITHUB_REPOSITORY")
            .ok_or_else(|| Error::Config("GITHUB_REPOSITORY not set".to_string()))?;
        ctx.repo = RepoRef::parse(&repository)?;
        Ok(ctx)
    }

    /// [`Context::event_from_env`] over an arbitrary variable lookup
    pub fn event_from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let event_name = var("GITHUB_EVENT_NAME")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Config("GitHub context is missing or invalid".to_string()))?;

        let repo = var("GITHUB_REPOSITORY")
            .and_then(|raw| RepoRef::parse(&raw).ok())
            .unwrap_or(RepoRef {
                owner: String::new(),
                name: String::new(),
            });

        let run_id = match var("GITHUB_RUN_ID") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| Error::Config(format!("Invalid GITHUB_RUN_ID: {}", raw)))?,
            None => 0,
        };

        let payload = match var("GITHUB_EVENT_PATH") {
            Some(path) if !path.is_empty() => Self::load_payload(Path::new(&path))?,
            _ => EventPayload::default(),
        };

        let or = |name: &str, default: &str| {
            var(name)
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            event_name: EventName::parse(&event_name),
            repo,
            run_id,
            server_url: or("GITHUB_SERVER_URL", "https://github.com"),
            api_url: or("GITHUB_API_URL", "https://api.github.com"),
            actor: or("GITHUB_ACTOR", ""),
            workflow: or("GITHUB_WORKFLOW", ""),
            payload,
        })
    }

    /// Parse a webhook payload file
    pub fn load_payload(path: &Path) -> Result<EventPayload> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::EventParse(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse_payload(&raw)
    }

    /// Parse a webhook payload document
    pub fn parse_payload(raw: &str) -> Result<EventPayload> {
        serde_json::from_str(raw).map_err(|e| Error::EventParse(e.to_string()))
    }

    /// Context with an empty payload, for callers that assemble one by hand
    pub fn new(event_name: EventName, repo: RepoRef) -> Self {
        Self {
            event_name,
            repo,
            run_id: 0,
            server_url: "https://github.com".to_string(),
            api_url: "https://api.github.com".to_string(),
            actor: String::new(),
            workflow: String::new(),
            payload: EventPayload::default(),
        }
    }

    /// Issue or pull request number the event refers to
    pub fn issue_number(&self) -> Option<u64> {
        self.payload
            .pull_request
            .as_ref()
            .map(|pr| pr.number)
            .or_else(|| self.payload.issue.as_ref().map(|issue| issue.number))
    }

    /// Browser URL of this workflow run
    pub fn run_url(&self) -> String {
        format!(
            "{}/{}/{}/actions/runs/{}",
            self.server_url.trim_end_matches('/'),
            self.repo.owner,
            self.repo.name,
            self.run_id
        )
    }
}
