use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::backend::{InventoryBackend, Page};
use crate::error::{Result, StoreError};
use crate::model::InventoryItem;
use crate::schema::{ItemKey, KeyQuery};

/// In-process inventory table with a secondary location ordering.
///
/// Intended for tests and local demos. Pages behave like DynamoDB: a full
/// page always carries a continuation key, even when nothing follows it.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    items: RwLock<BTreeMap<ItemKey, InventoryItem>>,
    page_size: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps every page at `page_size` items (at least one).
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            items: RwLock::default(),
            page_size: Some(page_size.max(1)),
        }
    }

    pub fn len(&self) -> Result<usize> {
        let items = self.items.read().map_err(|_| Self::poisoned())?;
        Ok(items.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn poisoned() -> StoreError {
        StoreError::backend("lock poisoned")
    }
}

/// Sort order of a query: the table sorts by `(id, location_id)`, the
/// location index by `(location_id, id)`.
fn sort_key(query: &KeyQuery, key: &ItemKey) -> (i64, String) {
    match query {
        KeyQuery::ById(_) => (key.location_id, String::new()),
        KeyQuery::ByLocation(_) => (0, key.id.clone()),
    }
}

#[async_trait]
impl InventoryBackend for MemoryBackend {
    async fn put_item(&self, item: &InventoryItem) -> Result<()> {
        let mut items = self.items.write().map_err(|_| Self::poisoned())?;
        items.insert(item.key(), item.clone());
        Ok(())
    }

    async fn query_page(
        &self,
        query: &KeyQuery,
        exclusive_start_key: Option<&ItemKey>,
        limit: Option<usize>,
    ) -> Result<Page> {
        let items = self.items.read().map_err(|_| Self::poisoned())?;

        let mut matches: Vec<&InventoryItem> = items
            .iter()
            .filter(|(key, _)| query.matches(key))
            .map(|(_, item)| item)
            .collect();
        matches.sort_by_key(|item| sort_key(query, &item.key()));

        if let Some(start) = exclusive_start_key {
            let start = sort_key(query, start);
            matches.retain(|item| sort_key(query, &item.key()) > start);
        }

        let page_size = match (limit, self.page_size) {
            (Some(limit), Some(size)) => Some(limit.min(size)),
            (limit, size) => limit.or(size),
        };

        let page: Vec<InventoryItem> = match page_size {
            Some(size) => matches.into_iter().take(size).cloned().collect(),
            None => matches.into_iter().cloned().collect(),
        };

        let last_evaluated_key = match (page_size, page.last()) {
            (Some(size), Some(last)) if page.len() == size => Some(last.key()),
            _ => None,
        };

        Ok(Page {
            items: page,
            last_evaluated_key,
        })
    }

    async fn delete_item(&self, key: &ItemKey) -> Result<()> {
        let mut items = self.items.write().map_err(|_| Self::poisoned())?;
        items.remove(key);
        Ok(())
    }
}
