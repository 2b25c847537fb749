pub mod github;

use anyhow::Result;
use async_trait::async_trait;

use crate::model::source_item::SourceItem;

/// One page of board items plus the cursor for the next request. A None
/// cursor means the collection is exhausted.
pub struct ItemPage {
    pub items: Vec<SourceItem>,
    pub next_cursor: Option<String>,
}

/// Page-fetch capability. Implementations own transport, auth, and page size.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, project_number: u32, cursor: Option<&str>) -> Result<ItemPage>;
}

/// Fetch every item of a project, in arrival order. Any page failure aborts
/// the whole collection; the caller decides what that means for the run.
pub async fn fetch_all_items(
    fetcher: &dyn PageFetcher,
    project_number: u32,
) -> Result<Vec<SourceItem>> {
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let page = fetcher.fetch_page(project_number, cursor.as_deref()).await?;
        items.extend(page.items);
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    Ok(items)
}
