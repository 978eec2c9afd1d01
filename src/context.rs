use std::sync::Arc;

use crate::config::ReviewSettings;
use crate::domain::pull_request::PrAliasResolver;
use crate::services::{IssueTrackerService, WikiService};

#[derive(Clone)]
pub struct AppContext {
    pub issue_tracker: Arc<dyn IssueTrackerService>,
    pub wiki: Arc<dyn WikiService>,
    pub pr_aliases: PrAliasResolver,
}

impl AppContext {
    pub fn new(
        review: ReviewSettings,
        issue_tracker: Arc<dyn IssueTrackerService>,
        wiki: Arc<dyn WikiService>,
    ) -> Self {
        Self {
            issue_tracker,
            wiki,
            pr_aliases: PrAliasResolver::new(review),
        }
    }
}
