//! Draining a paginated key query into one complete result set.

use std::future::Future;
use std::time::{Duration, Instant};

use tokio::time::timeout;
use tracing::debug;

use crate::backend::Page;
use crate::error::{Result, StoreError};
use crate::model::InventoryItem;
use crate::schema::ItemKey;

pub const DEFAULT_MAX_PAGES: usize = 1000;
pub const DEFAULT_MAX_ELAPSED: Duration = Duration::from_secs(30);

/// Safety caps for a drain. A store that keeps handing out continuation
/// keys is cut off by whichever cap trips first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub max_pages: usize,
    pub max_elapsed: Duration,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            max_elapsed: DEFAULT_MAX_ELAPSED,
        }
    }
}

/// Requests pages until one arrives without a continuation key.
///
/// `fetch` receives the exclusive start key for the page it should return,
/// `None` for the first one. Items are returned in page order. A fetch
/// still pending when `max_elapsed` runs out is dropped.
pub async fn drain_pages<F, Fut>(limits: PageLimits, mut fetch: F) -> Result<Vec<InventoryItem>>
where
    F: FnMut(Option<ItemKey>) -> Fut,
    Fut: Future<Output = Result<Page>>,
{
    let started = Instant::now();
    let mut items = Vec::new();
    let mut start: Option<ItemKey> = None;
    let mut pages = 0usize;

    loop {
        if pages >= limits.max_pages {
            return Err(StoreError::PaginationExhausted { pages });
        }

        let remaining = limits.max_elapsed.saturating_sub(started.elapsed());
        let page = timeout(remaining, fetch(start.clone()))
            .await
            .map_err(|_| StoreError::Timeout {
                elapsed: started.elapsed(),
            })??;
        pages += 1;
        items.extend(page.items);

        let Some(next) = page.last_evaluated_key else {
            break;
        };
        // a repeated cursor would loop forever
        if start.as_ref() == Some(&next) {
            return Err(StoreError::PaginationExhausted { pages });
        }
        let elapsed = started.elapsed();
        if elapsed > limits.max_elapsed {
            return Err(StoreError::Timeout { elapsed });
        }
        debug!(pages, count = items.len(), "following continuation key");
        start = Some(next);
    }

    debug!(pages, count = items.len(), "query drained");
    Ok(items)
}
