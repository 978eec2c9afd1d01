use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::context::AppContext;
use crate::domain::status::normalize;
use crate::domain::ticket::{Reviewer, ReviewerOutcome, ReviewerOutcomeStatus, Ticket, Transition};
use crate::error::{AppError, AppResult};

/// Upper bound on tickets returned by a single search.
pub const SEARCH_PAGE_SIZE: usize = 25;

#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    pub key: String,
    pub requested: String,
    pub transition: Transition,
}

pub async fn fetch_ticket(ctx: &AppContext, key: &str) -> AppResult<Ticket> {
    let key = ticket_key(key)?;
    let tracker = &ctx.issue_tracker;
    let (issue, comments) =
        tokio::try_join!(tracker.fetch_issue(key), tracker.fetch_comments(key))?;
    let pull_requests = ctx.pr_aliases.references(&comments);
    Ok(Ticket::from_issue(issue, pull_requests))
}

pub async fn list_transitions(ctx: &AppContext, key: &str) -> AppResult<Vec<Transition>> {
    ctx.issue_tracker.fetch_transitions(ticket_key(key)?).await
}

pub async fn apply_transition(
    ctx: &AppContext,
    key: &str,
    status_phrase: &str,
) -> AppResult<TransitionOutcome> {
    let key = ticket_key(key)?;
    let requested = normalize(status_phrase);
    let transitions = ctx.issue_tracker.fetch_transitions(key).await?;

    let Some(transition) = transitions
        .iter()
        .find(|transition| transition.leads_to(requested.as_str()))
        .cloned()
    else {
        return Err(AppError::InvalidTransition {
            requested: requested.as_str().to_string(),
            available: transitions.into_iter().map(|t| t.name).collect(),
        });
    };

    ctx.issue_tracker
        .execute_transition(key, &transition.id)
        .await?;
    info!(key, transition = %transition.name, "ticket transitioned");

    Ok(TransitionOutcome {
        key: key.to_string(),
        requested: requested.as_str().to_string(),
        transition,
    })
}

pub async fn search_by_team_and_status(
    ctx: &AppContext,
    team: &str,
    status_phrase: &str,
) -> AppResult<Vec<Ticket>> {
    let status = normalize(status_phrase);
    let jql = format!(
        "Team = \"{}\" AND status = \"{}\" ORDER BY updated DESC",
        jql_escape(required("team", team)?),
        jql_escape(required("status", status.as_str())?),
    );
    search_with_pull_requests(ctx, &jql).await
}

pub async fn search_by_sprint_and_team(
    ctx: &AppContext,
    sprint: &str,
    team: &str,
) -> AppResult<Vec<Ticket>> {
    let jql = format!(
        "sprint = \"{}\" AND Team = \"{}\" ORDER BY updated DESC",
        jql_escape(required("sprint", sprint)?),
        jql_escape(required("team", team)?),
    );
    search_with_pull_requests(ctx, &jql).await
}

async fn search_with_pull_requests(ctx: &AppContext, jql: &str) -> AppResult<Vec<Ticket>> {
    let issues = ctx.issue_tracker.search(jql, SEARCH_PAGE_SIZE).await?;
    let comment_slots = join_all(
        issues
            .iter()
            .map(|issue| ctx.issue_tracker.fetch_comments(&issue.key)),
    )
    .await;

    Ok(issues
        .into_iter()
        .zip(comment_slots)
        .map(|(issue, comments)| {
            let pull_requests = match comments {
                Ok(comments) => ctx.pr_aliases.references(&comments),
                Err(err) => {
                    warn!(
                        key = %issue.key,
                        error = %err,
                        "could not load comments; listing ticket without pull requests"
                    );
                    Vec::new()
                }
            };
            Ticket::from_issue(issue, pull_requests)
        })
        .collect())
}

/// Adds `username` to the code reviewers of every ticket in `keys`. Each
/// ticket is handled on its own; a failure is reported in that ticket's
/// outcome only.
pub async fn add_code_reviewer(
    ctx: &AppContext,
    keys: &[String],
    username: &str,
) -> AppResult<Vec<ReviewerOutcome>> {
    let username = required("username", username)?;
    if keys.is_empty() {
        return Err(AppError::InvalidArguments(
            "at least one ticket key is required".to_string(),
        ));
    }

    let outcomes = join_all(keys.iter().map(|key| async move {
        match add_reviewer_to_ticket(ctx, key, username).await {
            Ok(status) => ReviewerOutcome {
                key: key.clone(),
                status,
                message: match status {
                    ReviewerOutcomeStatus::Skipped => "Already a reviewer".to_string(),
                    _ => "Added as reviewer".to_string(),
                },
            },
            Err(err) => {
                warn!(key = %key, error = %err, "failed to add code reviewer");
                ReviewerOutcome {
                    key: key.clone(),
                    status: ReviewerOutcomeStatus::Error,
                    message: err.caller_message(),
                }
            }
        }
    }))
    .await;

    Ok(outcomes)
}

async fn add_reviewer_to_ticket(
    ctx: &AppContext,
    key: &str,
    username: &str,
) -> AppResult<ReviewerOutcomeStatus> {
    let key = ticket_key(key)?;
    let issue = ctx.issue_tracker.fetch_issue(key).await?;
    if issue
        .reviewers
        .iter()
        .any(|reviewer| reviewer.name == username)
    {
        return Ok(ReviewerOutcomeStatus::Skipped);
    }

    let mut reviewers = issue.reviewers;
    reviewers.push(Reviewer {
        name: username.to_string(),
    });
    ctx.issue_tracker.set_reviewers(key, &reviewers).await?;
    info!(key, username, "code reviewer added");
    Ok(ReviewerOutcomeStatus::Success)
}

fn ticket_key(key: &str) -> AppResult<&str> {
    let key = required("key", key)?;
    if key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        Ok(key)
    } else {
        Err(AppError::InvalidArguments(format!(
            "'{key}' is not a valid ticket key"
        )))
    }
}

fn required<'a>(field: &str, value: &'a str) -> AppResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidArguments(format!(
            "{field} must not be empty"
        )));
    }
    Ok(trimmed)
}

fn jql_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
