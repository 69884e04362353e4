//! GitHub REST API wire models (only the fields this crate reads)

use crate::types::AuthorAssociation;
use serde::{Deserialize, Deserializer, Serialize};

/// `null` and absent both become `T::default()`
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// GitHub user (comment author, actor)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Login name
    #[serde(default)]
    pub login: String,
    /// Account type: `User`, `Bot` or `Organization`
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl User {
    /// GitHub App / Actions bot account
    #[inline]
    pub fn is_bot(&self) -> bool {
        self.kind == "Bot"
    }
}

/// Issue or pull request comment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueComment {
    /// Comment id
    pub id: u64,
    /// Markdown body
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
    /// Author; deleted accounts come back as `null`
    #[serde(default, deserialize_with = "null_as_default")]
    pub user: User,
    /// Author's relationship to the repository
    #[serde(default)]
    pub author_association: AuthorAssociation,
}

/// Repository reference inside a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// `owner/name`
    pub full_name: String,
}

/// Head or base of a pull request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    /// Commit SHA
    pub sha: String,
    /// Repository; `null` when the fork has been deleted
    #[serde(default)]
    pub repo: Option<Repository>,
}

/// Pull request (event payload or `GET /pulls/{n}`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Pull request number
    pub number: u64,
    /// Source branch
    pub head: PullRequestRef,
    /// Target branch
    pub base: PullRequestRef,
}

impl PullRequest {
    /// Head and base live in different repositories
    ///
    /// A deleted head repository counts as a fork.
    pub fn is_fork(&self) -> bool {
        let head = self.head.repo.as_ref().map(|r| r.full_name.as_str());
        let base = self.base.repo.as_ref().map(|r| r.full_name.as_str());
        head.is_none() || head != base
    }

    /// `owner/name` of the head repository, `<deleted>` if gone
    pub fn head_repo_name(&self) -> &str {
        self.head
            .repo
            .as_ref()
            .map(|r| r.full_name.as_str())
            .unwrap_or("<deleted>")
    }

    /// `owner/name` of the base repository
    pub fn base_repo_name(&self) -> &str {
        self.base
            .repo
            .as_ref()
            .map(|r| r.full_name.as_str())
            .unwrap_or("<deleted>")
    }
}

/// Issue as carried by `issue_comment` payloads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue / pull request number
    pub number: u64,
    /// Present (non-null) only when the issue is a pull request
    #[serde(default)]
    pub pull_request: Option<serde_json::Value>,
}

impl Issue {
    /// Whether this issue is a pull request
    #[inline]
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }
}

/// Response of `POST /repos/{owner}/{repo}/issues`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedIssue {
    /// New issue number
    pub number: u64,
    /// Browser URL
    #[serde(default)]
    pub html_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pr(head: Option<&str>, base: &str) -> PullRequest {
        serde_json::from_value(json!({
            "number": 7,
            "head": {"sha": "abc", "repo": head.map(|h| json!({"full_name": h}))},
            "base": {"sha": "def", "repo": {"full_name": base}},
        }))
        .unwrap()
    }

    #[test]
    fn test_is_fork() {
        assert!(!pr(Some("org/infra"), "org/infra").is_fork());
        assert!(pr(Some("someone/infra"), "org/infra").is_fork());
        assert!(pr(None, "org/infra").is_fork());
    }

    #[test]
    fn test_repo_names() {
        let p = pr(None, "org/infra");
        assert_eq!(p.head_repo_name(), "<deleted>");
        assert_eq!(p.base_repo_name(), "org/infra");
    }

    #[test]
    fn test_comment_tolerates_nulls() {
        let comment: IssueComment = serde_json::from_value(json!({
            "id": 1,
            "body": null,
            "user": null,
            "author_association": "MEMBER",
        }))
        .unwrap();
        assert_eq!(comment.body, "");
        assert_eq!(comment.user, User::default());
        assert!(comment.author_association.is_maintainer());
    }

    #[test]
    fn test_bot_user() {
        let comment: IssueComment = serde_json::from_value(json!({
            "id": 2,
            "body": "report",
            "user": {"login": "github-actions[bot]", "type": "Bot"},
        }))
        .unwrap();
        assert!(comment.user.is_bot());
        assert_eq!(comment.author_association, AuthorAssociation::None);
    }

    #[test]
    fn test_issue_pull_request_flag() {
        let issue: Issue =
            serde_json::from_value(json!({"number": 3, "pull_request": {"url": "x"}})).unwrap();
        assert!(issue.is_pull_request());
        let issue: Issue = serde_json::from_value(json!({"number": 3})).unwrap();
        assert!(!issue.is_pull_request());
    }
}
