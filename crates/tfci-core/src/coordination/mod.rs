//! Check-then-act flows against the issues API

pub mod approval;
pub mod report;

pub use approval::{ApprovalDecision, ApprovalGate, DecisionReason};
pub use report::{PublishOutcome, ReportPublisher};

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory issues API

    use crate::error::{Error, Result};
    use crate::http::models::{
        CreatedIssue, IssueComment, PullRequest, PullRequestRef, Repository, User,
    };
    use crate::traits::IssuesApi;
    use crate::types::AuthorAssociation;
    use std::sync::Mutex;

    pub fn comment(id: u64, body: &str, login: &str, association: AuthorAssociation) -> IssueComment {
        IssueComment {
            id,
            body: body.to_string(),
            user: User {
                login: login.to_string(),
                kind: "User".to_string(),
            },
            author_association: association,
        }
    }

    pub fn bot_comment(id: u64, body: &str) -> IssueComment {
        IssueComment {
            id,
            body: body.to_string(),
            user: User {
                login: "github-actions[bot]".to_string(),
                kind: "Bot".to_string(),
            },
            author_association: AuthorAssociation::None,
        }
    }

    pub fn pull_request(number: u64, head: &str, sha: &str) -> PullRequest {
        PullRequest {
            number,
            head: PullRequestRef {
                sha: sha.to_string(),
                repo: Some(Repository {
                    full_name: head.to_string(),
                }),
            },
            base: PullRequestRef {
                sha: "base".to_string(),
                repo: Some(Repository {
                    full_name: "org/infra".to_string(),
                }),
            },
        }
    }

    #[derive(Default)]
    struct State {
        comments: Vec<IssueComment>,
        created: Vec<(u64, String)>,
        updated: Vec<(u64, String)>,
        issues: Vec<(String, String)>,
        list_calls: usize,
        next_id: u64,
    }

    /// Comments posted through the fake are authored by a bot account
    #[derive(Default)]
    pub struct FakeIssues {
        state: Mutex<State>,
        pull: Option<PullRequest>,
        poster_association: AuthorAssociation,
    }

    impl FakeIssues {
        pub fn with_comments(comments: Vec<IssueComment>) -> Self {
            let fake = Self::default();
            fake.state.lock().unwrap().comments = comments;
            fake
        }

        pub fn with_pull(mut self, pull: PullRequest) -> Self {
            self.pull = Some(pull);
            self
        }

        /// Association reported for comments the fake posts
        pub fn posting_as(mut self, association: AuthorAssociation) -> Self {
            self.poster_association = association;
            self
        }

        pub fn created(&self) -> Vec<(u64, String)> {
            self.state.lock().unwrap().created.clone()
        }

        pub fn updated(&self) -> Vec<(u64, String)> {
            self.state.lock().unwrap().updated.clone()
        }

        pub fn issues(&self) -> Vec<(String, String)> {
            self.state.lock().unwrap().issues.clone()
        }

        pub fn list_calls(&self) -> usize {
            self.state.lock().unwrap().list_calls
        }
    }

    impl IssuesApi for FakeIssues {
        async fn list_issue_comments(&self, _issue_number: u64) -> Result<Vec<IssueComment>> {
            let mut state = self.state.lock().unwrap();
            state.list_calls += 1;
            Ok(state.comments.clone())
        }

        async fn create_issue_comment(&self, issue_number: u64, body: &str) -> Result<IssueComment> {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let id = 1000 + state.next_id;
            let mut posted = bot_comment(id, body);
            posted.author_association = self.poster_association;
            state.comments.push(posted.clone());
            state.created.push((issue_number, body.to_string()));
            Ok(posted)
        }

        async fn update_issue_comment(&self, comment_id: u64, body: &str) -> Result<IssueComment> {
            let mut state = self.state.lock().unwrap();
            state.updated.push((comment_id, body.to_string()));
            let existing = state
                .comments
                .iter_mut()
                .find(|c| c.id == comment_id)
                .ok_or_else(|| Error::Api {
                    status: 404,
                    message: "update issue comment: Not Found".to_string(),
                })?;
            existing.body = body.to_string();
            Ok(existing.clone())
        }

        async fn create_issue(&self, title: &str, body: &str) -> Result<CreatedIssue> {
            let mut state = self.state.lock().unwrap();
            state.issues.push((title.to_string(), body.to_string()));
            Ok(CreatedIssue {
                number: state.issues.len() as u64,
                html_url: None,
            })
        }

        async fn get_pull_request(&self, number: u64) -> Result<PullRequest> {
            self.pull.clone().ok_or_else(|| Error::Api {
                status: 404,
                message: format!("get pull request {}: Not Found", number),
            })
        }
    }
}
