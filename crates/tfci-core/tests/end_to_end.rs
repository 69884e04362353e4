//! Gate and report flows through the library entry points, against a mock
//! GitHub API

use httpmock::prelude::*;
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use tfci_core::coordination::DecisionReason;
use tfci_core::{
    evaluate_gate, publish_report, Context, EventName, GateConfig, PublishOutcome, RepoRef,
    ReportInputs,
};

fn ctx(server: &MockServer, event: EventName, payload: serde_json::Value) -> Context {
    let mut ctx = Context::new(event, RepoRef::parse("org/infra").unwrap());
    ctx.api_url = server.base_url();
    ctx.run_id = 4200;
    ctx.actor = "octocat".to_string();
    ctx.payload = Context::parse_payload(&payload.to_string()).unwrap();
    ctx
}

fn fork_pr_payload(sha: &str) -> serde_json::Value {
    json!({
        "pull_request": {
            "number": 12,
            "head": {"sha": sha, "repo": {"full_name": "contributor/infra"}},
            "base": {"sha": "base", "repo": {"full_name": "org/infra"}}
        }
    })
}

fn token() -> Option<String> {
    Some("ghs_test".to_string())
}

#[tokio::test]
async fn test_fork_pull_request_waits_for_approval() {
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method(GET)
            .path("/repos/org/infra/issues/12/comments")
            .header("authorization", "Bearer ghs_test");
        then.status(200).json_body(json!([
            {"id": 1, "body": "<!-- APPROVAL_MARKER:old -->", "author_association": "MEMBER"}
        ]));
    });

    let ctx = ctx(&server, EventName::PullRequest, fork_pr_payload("new"));
    let decision = evaluate_gate(&ctx, &GateConfig::default(), token())
        .await
        .unwrap();

    list.assert();
    assert!(!decision.should_run);
    assert_eq!(decision.reason, DecisionReason::AwaitingApproval);
}

#[tokio::test]
async fn test_fork_pull_request_with_approval_runs() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repos/org/infra/issues/12/comments");
        then.status(200).json_body(json!([
            {"id": 1, "body": "## ✅ Test Approved\n<!-- APPROVAL_MARKER:abc -->", "author_association": "OWNER"}
        ]));
    });

    let ctx = ctx(&server, EventName::PullRequest, fork_pr_payload("abc"));
    let decision = evaluate_gate(&ctx, &GateConfig::default(), token())
        .await
        .unwrap();

    assert!(decision.should_run);
    assert_eq!(decision.reason, DecisionReason::Approved);
}

#[tokio::test]
async fn test_maintainer_comment_records_approval() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repos/org/infra/pulls/12");
        then.status(200).json_body(json!({
            "number": 12,
            "head": {"sha": "abc", "repo": {"full_name": "contributor/infra"}},
            "base": {"sha": "base", "repo": {"full_name": "org/infra"}}
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/repos/org/infra/issues/12/comments");
        then.status(200).json_body(json!([]));
    });
    let post = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/org/infra/issues/12/comments")
            .body_includes("APPROVAL_MARKER:abc")
            .body_includes("@maintainer has approved");
        then.status(201).json_body(json!({"id": 77, "body": "ok"}));
    });

    let ctx = ctx(
        &server,
        EventName::IssueComment,
        json!({
            "issue": {"number": 12, "pull_request": {"url": "x"}},
            "comment": {
                "id": 5,
                "body": "/allow",
                "user": {"login": "maintainer", "type": "User"},
                "author_association": "MEMBER"
            }
        }),
    );
    let config = GateConfig {
        jitter_unit: std::time::Duration::ZERO,
        ..GateConfig::default()
    };
    let decision = evaluate_gate(&ctx, &config, token()).await.unwrap();

    post.assert();
    assert!(decision.should_run);
    assert_eq!(decision.reason, DecisionReason::ApprovalRecorded);
}

#[tokio::test]
async fn test_gate_surfaces_api_failure() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repos/org/infra/issues/12/comments");
        then.status(401).json_body(json!({"message": "Bad credentials"}));
    });

    let ctx = ctx(&server, EventName::PullRequest, fork_pr_payload("abc"));
    let err = evaluate_gate(&ctx, &GateConfig::default(), token())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));
}

fn workdir_with_outputs() -> (TempDir, ReportInputs) {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("tfplan.txt"), "No changes.").unwrap();
    fs::write(dir.path().join("tfplan_stderr.out"), "").unwrap();
    fs::write(dir.path().join("tfplan_stdout.out"), "").unwrap();
    fs::write(dir.path().join("tfvalidate_stdout.out"), "Success!").unwrap();
    fs::write(dir.path().join("tfvalidate_stderr.out"), "").unwrap();
    let inputs = ReportInputs {
        workdir: dir.path().to_string_lossy().into_owned(),
        tf_version: "1.9.0".to_string(),
        tf_platform: "linux_x64".to_string(),
        fmt_outcome: "success".to_string(),
        init_outcome: "success".to_string(),
        validate_outcome: "success".to_string(),
        plan_outcome: "success".to_string(),
        plan_exit_code: "0".to_string(),
        ..ReportInputs::default()
    };
    (dir, inputs)
}

#[tokio::test]
async fn test_report_updates_existing_bot_comment() {
    let (dir, inputs) = workdir_with_outputs();
    let marker = format!("Working Directory: `{}`", dir.path().display());

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repos/org/infra/issues/12/comments");
        then.status(200).json_body(json!([
            {"id": 3, "body": marker.clone(), "user": {"login": "someone", "type": "User"}},
            {"id": 9, "body": marker.clone(), "user": {"login": "github-actions[bot]", "type": "Bot"}}
        ]));
    });
    let update = server.mock(|when, then| {
        when.method(PATCH)
            .path("/repos/org/infra/issues/comments/9")
            .body_includes("All tests passed successfully");
        then.status(200).json_body(json!({"id": 9, "body": "updated"}));
    });

    let ctx = ctx(&server, EventName::PullRequest, fork_pr_payload("abc"));
    let (report, outcome) = publish_report(inputs, &ctx, token()).await.unwrap();

    update.assert();
    assert_eq!(outcome, PublishOutcome::UpdatedComment { id: 9 });
    assert!(report.failures().is_empty());
    assert_eq!(report.pusher(), "octocat");
}

#[tokio::test]
async fn test_scheduled_failure_opens_issue() {
    let (_dir, mut inputs) = workdir_with_outputs();
    inputs.plan_outcome = "failure".to_string();
    inputs.plan_exit_code = "1".to_string();
    inputs.owner = Some("infra-team".to_string());

    let server = MockServer::start();
    let issue = server.mock(|when, then| {
        when.method(POST)
            .path("/repos/org/infra/issues")
            .body_includes("[bug] E2E Terraform Test Failure")
            .body_includes("@infra-team");
        then.status(201).json_body(json!({
            "number": 31,
            "html_url": "https://github.com/org/infra/issues/31"
        }));
    });

    let ctx = ctx(&server, EventName::Schedule, json!({}));
    let (report, outcome) = publish_report(inputs, &ctx, token()).await.unwrap();

    issue.assert();
    assert_eq!(
        outcome,
        PublishOutcome::CreatedIssue {
            number: 31,
            url: Some("https://github.com/org/infra/issues/31".to_string()),
        }
    );
    assert_eq!(report.failures(), vec!["Terraform Plan failed"]);
}

#[tokio::test]
async fn test_push_event_posts_nothing() {
    let (_dir, inputs) = workdir_with_outputs();
    // No mocks: any request would fail with a 404
    let server = MockServer::start();

    let ctx = ctx(&server, EventName::parse("push"), json!({}));
    let (_, outcome) = publish_report(inputs, &ctx, token()).await.unwrap();

    assert_eq!(outcome, PublishOutcome::Skipped);
}
