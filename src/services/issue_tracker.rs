use async_trait::async_trait;

use crate::domain::ticket::{Comment, Issue, Reviewer, Transition};
use crate::error::AppResult;

#[async_trait]
pub trait IssueTrackerService: Send + Sync {
    async fn fetch_issue(&self, key: &str) -> AppResult<Issue>;
    async fn fetch_comments(&self, key: &str) -> AppResult<Vec<Comment>>;
    /// Transitions available from the issue's current status.
    async fn fetch_transitions(&self, key: &str) -> AppResult<Vec<Transition>>;
    async fn execute_transition(&self, key: &str, transition_id: &str) -> AppResult<()>;
    async fn search(&self, jql: &str, max_results: usize) -> AppResult<Vec<Issue>>;
    async fn set_reviewers(&self, key: &str, reviewers: &[Reviewer]) -> AppResult<()>;
}
