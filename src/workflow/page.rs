use tracing::info;

use crate::context::AppContext;
use crate::domain::page::{ConnectionReport, PageRevision, PageUpdate, WikiPage};
use crate::error::{AppError, AppResult};

pub async fn fetch_page(ctx: &AppContext, page_id: &str) -> AppResult<WikiPage> {
    ctx.wiki.fetch_page(page_id_arg(page_id)?).await
}

/// Replaces the page body. The stored version must be exactly one past the
/// version read here, otherwise the wiki rejects the write as a conflict.
pub async fn update_page(
    ctx: &AppContext,
    page_id: &str,
    html_content: &str,
    minor_edit: bool,
) -> AppResult<PageRevision> {
    let current = ctx.wiki.fetch_page(page_id_arg(page_id)?).await?;
    let update = PageUpdate {
        id: current.id,
        title: current.title,
        version: current.version + 1,
        space_key: current.space.key,
        html_content: html_content.to_string(),
        minor_edit,
    };
    let revision = ctx.wiki.store_page(&update).await?;
    info!(page_id = %revision.id, version = revision.version, "page updated");
    Ok(revision)
}

pub async fn check_connection(ctx: &AppContext) -> ConnectionReport {
    ctx.wiki.check_connection().await
}

fn page_id_arg(page_id: &str) -> AppResult<&str> {
    let page_id = page_id.trim();
    if page_id.is_empty() || !page_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::InvalidArguments(format!(
            "'{page_id}' is not a valid page id"
        )));
    }
    Ok(page_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::page::Space;
    use crate::testing::{FakeTracker, FakeWiki, context_with_wiki};

    fn wiki_with_page() -> FakeWiki {
        let mut wiki = FakeWiki::default();
        wiki.pages.insert(
            "42".to_string(),
            WikiPage {
                id: "42".to_string(),
                title: "Runbook".to_string(),
                version: 7,
                space: Space {
                    key: "OPS".to_string(),
                    name: "Operations".to_string(),
                },
                labels: vec!["oncall".to_string()],
                last_updated: None,
                updated_by: None,
                html_content: "<p>old</p>".to_string(),
            },
        );
        wiki
    }

    #[tokio::test]
    async fn update_bumps_version_and_keeps_title_and_space() {
        let (ctx, _, wiki) = context_with_wiki(FakeTracker::default(), wiki_with_page());
        let revision = update_page(&ctx, "42", "<p>new</p>", true).await.unwrap();
        assert_eq!(revision.version, 8);

        let stored = wiki.stored.lock().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].title, "Runbook");
        assert_eq!(stored[0].space_key, "OPS");
        assert_eq!(stored[0].html_content, "<p>new</p>");
        assert!(stored[0].minor_edit);
    }

    #[tokio::test]
    async fn update_of_missing_page_writes_nothing() {
        let (ctx, _, wiki) = context_with_wiki(FakeTracker::default(), FakeWiki::default());
        assert!(update_page(&ctx, "7", "<p/>", false).await.is_err());
        assert!(wiki.stored.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_non_numeric_page_ids() {
        let (ctx, _, _) = context_with_wiki(FakeTracker::default(), wiki_with_page());
        assert!(matches!(
            fetch_page(&ctx, "../42").await,
            Err(AppError::InvalidArguments(_))
        ));
    }
}
