use serde::Serialize;

use crate::domain::pull_request::PullRequestReference;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub body: String,
}

/// Issue fields as reported by the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub assignee: Option<String>,
    pub description: Option<String>,
    pub reviewers: Vec<Reviewer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub id: String,
    pub name: String,
    /// Status the ticket lands in, when the tracker reports it.
    pub target: Option<String>,
}

impl Transition {
    /// Matches either the transition's own name or its target status.
    pub fn leads_to(&self, status: &str) -> bool {
        let status = status.to_lowercase();
        self.name.to_lowercase() == status
            || self
                .target
                .as_deref()
                .is_some_and(|target| target.to_lowercase() == status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reviewer {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Ticket {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub assignee: Option<String>,
    pub description: Option<String>,
    pub pull_requests: Vec<PullRequestReference>,
}

impl Ticket {
    pub fn from_issue(issue: Issue, pull_requests: Vec<PullRequestReference>) -> Self {
        Self {
            key: issue.key,
            summary: issue.summary,
            status: issue.status,
            assignee: issue.assignee,
            description: issue.description,
            pull_requests,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewerOutcomeStatus {
    Success,
    Skipped,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewerOutcome {
    pub key: String,
    pub status: ReviewerOutcomeStatus,
    pub message: String,
}
