//! # tfci Core
//!
//! GitHub Actions glue for Terraform end-to-end test workflows:
//! - **Approval gate**: decides whether tests run on a pull request, with
//!   maintainer approval comments for fork pull requests
//! - **Path classifier**: maps changed files to the root configuration
//!   directories whose tests must run
//! - **Report formatter**: renders Terraform step outcomes as Markdown and
//!   posts them as a pull request comment or failure issue
//!
//! ## Example
//!
//! ```no_run
//! use tfci_core::{classify_changes, ClassifierConfig, Context};
//!
//! # fn example() -> tfci_core::Result<()> {
//! let ctx = Context::from_env()?;
//! let result = classify_changes("configurations/a/main.tf", &ctx, &ClassifierConfig::default())?;
//! println!("{}", result.to_json());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, rust_2018_idioms)]

pub mod changes;
pub mod context;
pub mod coordination;
pub mod error;
pub mod file_ops;
pub mod http;
pub mod output;
pub mod platform;
pub mod traits;
pub mod types;

pub use changes::{Classification, PathClassifier};
pub use context::{Context, RepoRef};
pub use coordination::{ApprovalDecision, ApprovalGate, PublishOutcome, ReportPublisher};
pub use error::{Error, Result};
pub use http::GitHubApiClient;
pub use output::TerraformReport;
pub use types::{
    ClassifierConfig, Diagnostic, EventName, GateConfig, ReportInputs, TestTarget,
};

/// Classify a raw change list into test targets
pub fn classify_changes(
    changes: &str,
    ctx: &Context,
    config: &ClassifierConfig,
) -> Result<Classification> {
    PathClassifier::new(config).classify(changes, ctx)
}

/// [`classify_changes`] with the context read from the environment
///
/// Blank input short-circuits before any environment lookup. Otherwise only
/// the event name and payload are required.
pub fn classify_from_env(changes: &str, config: &ClassifierConfig) -> Result<Classification> {
    if changes.trim().is_empty() {
        return Ok(Classification::default());
    }
    let ctx = Context::event_from_env()?;
    classify_changes(changes, &ctx, config)
}

/// Run the approval gate against the GitHub API at `ctx.api_url`
pub async fn evaluate_gate(
    ctx: &Context,
    config: &GateConfig,
    token: Option<String>,
) -> Result<ApprovalDecision> {
    let client = GitHubApiClient::new(ctx.api_url.as_str(), token, ctx.repo.clone());
    ApprovalGate::new(&client, config).decide(ctx).await
}

/// Render the report for `inputs` and post it for the current event
///
/// The report is returned alongside the outcome so callers can echo log
/// groups and set the final status.
pub async fn publish_report(
    inputs: ReportInputs,
    ctx: &Context,
    token: Option<String>,
) -> Result<(TerraformReport, PublishOutcome)> {
    let report = TerraformReport::load(inputs, ctx);
    let client = GitHubApiClient::new(ctx.api_url.as_str(), token, ctx.repo.clone());
    let outcome = ReportPublisher::new(&client).publish(&report, ctx).await?;
    Ok((report, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        let _ = env!("CARGO_PKG_VERSION");
    }

    #[test]
    fn test_blank_changes_skip_context_loading() {
        let config = ClassifierConfig {
            base_dir: std::path::PathBuf::from("/nonexistent"),
            ..ClassifierConfig::default()
        };
        for blank in ["", "  ", "\n\t"] {
            let result = classify_from_env(blank, &config).unwrap();
            assert!(result.targets.is_empty());
            assert!(result.diagnostics.is_empty());
            assert_eq!(result.to_json(), "[]");
        }
    }
}
