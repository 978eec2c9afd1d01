use async_trait::async_trait;

use crate::domain::page::{ConnectionReport, PageRevision, PageUpdate, WikiPage};
use crate::error::AppResult;

#[async_trait]
pub trait WikiService: Send + Sync {
    async fn fetch_page(&self, page_id: &str) -> AppResult<WikiPage>;
    async fn store_page(&self, update: &PageUpdate) -> AppResult<PageRevision>;
    async fn check_connection(&self) -> ConnectionReport;
}
