//! In-memory stand-ins for the remote services.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::ReviewSettings;
use crate::context::AppContext;
use crate::domain::page::{ConnectionReport, PageRevision, PageUpdate, WikiPage};
use crate::domain::ticket::{Comment, Issue, Reviewer, Transition};
use crate::error::{AppError, AppResult};
use crate::services::{IssueTrackerService, WikiService};

#[derive(Default)]
pub struct FakeTracker {
    pub issues: HashMap<String, Issue>,
    pub comments: HashMap<String, Vec<Comment>>,
    pub failing_comments: Vec<String>,
    pub transitions: Vec<Transition>,
    pub reject_transitions: bool,
    pub search_results: Vec<String>,
    pub executed: Mutex<Vec<(String, String)>>,
    pub queries: Mutex<Vec<String>>,
    pub page_sizes: Mutex<Vec<usize>>,
    pub reviewer_writes: Mutex<Vec<(String, Vec<Reviewer>)>>,
}

impl FakeTracker {
    pub fn with_issue(mut self, key: &str, summary: &str, comments: &[&str]) -> Self {
        self.issues.insert(key.to_string(), issue(key, summary));
        self.comments.insert(
            key.to_string(),
            comments
                .iter()
                .map(|body| Comment {
                    body: body.to_string(),
                })
                .collect(),
        );
        self
    }
}

pub fn issue(key: &str, summary: &str) -> Issue {
    Issue {
        key: key.to_string(),
        summary: summary.to_string(),
        status: "Open".to_string(),
        assignee: None,
        description: None,
        reviewers: Vec::new(),
    }
}

fn not_found(operation: &str, key: &str) -> AppError {
    AppError::remote(operation, format!("Jira responded with 404 Not Found: {key}"))
}

#[async_trait]
impl IssueTrackerService for FakeTracker {
    async fn fetch_issue(&self, key: &str) -> AppResult<Issue> {
        self.issues
            .get(key)
            .cloned()
            .ok_or_else(|| not_found("read ticket", key))
    }

    async fn fetch_comments(&self, key: &str) -> AppResult<Vec<Comment>> {
        if self.failing_comments.iter().any(|failing| failing == key) {
            return Err(AppError::remote(
                "read ticket comments",
                "Jira responded with 500 Internal Server Error",
            ));
        }
        self.comments
            .get(key)
            .cloned()
            .ok_or_else(|| not_found("read ticket comments", key))
    }

    async fn fetch_transitions(&self, _key: &str) -> AppResult<Vec<Transition>> {
        Ok(self.transitions.clone())
    }

    async fn execute_transition(&self, key: &str, transition_id: &str) -> AppResult<()> {
        self.executed
            .lock()
            .unwrap()
            .push((key.to_string(), transition_id.to_string()));
        if self.reject_transitions {
            return Err(AppError::remote(
                "transition ticket",
                "Jira responded with 400 Bad Request: resolution required",
            ));
        }
        Ok(())
    }

    async fn search(&self, jql: &str, max_results: usize) -> AppResult<Vec<Issue>> {
        self.queries.lock().unwrap().push(jql.to_string());
        self.page_sizes.lock().unwrap().push(max_results);
        Ok(self
            .search_results
            .iter()
            .filter_map(|key| self.issues.get(key).cloned())
            .take(max_results)
            .collect())
    }

    async fn set_reviewers(&self, key: &str, reviewers: &[Reviewer]) -> AppResult<()> {
        self.reviewer_writes
            .lock()
            .unwrap()
            .push((key.to_string(), reviewers.to_vec()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeWiki {
    pub pages: HashMap<String, WikiPage>,
    pub stored: Mutex<Vec<PageUpdate>>,
}

#[async_trait]
impl WikiService for FakeWiki {
    async fn fetch_page(&self, page_id: &str) -> AppResult<WikiPage> {
        self.pages
            .get(page_id)
            .cloned()
            .ok_or_else(|| AppError::remote("fetch page", "Confluence responded with 404"))
    }

    async fn store_page(&self, update: &PageUpdate) -> AppResult<PageRevision> {
        self.stored.lock().unwrap().push(update.clone());
        let current = self.fetch_page(&update.id).await?;
        Ok(PageRevision {
            id: update.id.clone(),
            title: update.title.clone(),
            version: update.version,
            space: current.space,
            last_updated: None,
            updated_by: None,
        })
    }

    async fn check_connection(&self) -> ConnectionReport {
        ConnectionReport {
            success: true,
            message: "Successfully connected to Confluence".to_string(),
            server_url: "https://wiki.example.com".to_string(),
            username: None,
            status_code: None,
        }
    }
}

pub fn context(tracker: FakeTracker) -> (AppContext, Arc<FakeTracker>) {
    let (ctx, tracker, _) = context_with_wiki(tracker, FakeWiki::default());
    (ctx, tracker)
}

pub fn context_with_wiki(
    tracker: FakeTracker,
    wiki: FakeWiki,
) -> (AppContext, Arc<FakeTracker>, Arc<FakeWiki>) {
    let tracker = Arc::new(tracker);
    let wiki = Arc::new(wiki);
    let ctx = AppContext::new(ReviewSettings::default(), tracker.clone(), wiki.clone());
    (ctx, tracker, wiki)
}
