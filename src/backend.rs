use async_trait::async_trait;

use crate::error::Result;
use crate::model::InventoryItem;
use crate::schema::{ItemKey, KeyQuery};

/// One page of a key query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<InventoryItem>,
    /// Set when the store may hold further matches. Pass it back as the
    /// exclusive start key of the next request.
    pub last_evaluated_key: Option<ItemKey>,
}

/// The storage boundary the inventory operations are written against.
#[async_trait]
pub trait InventoryBackend: Send + Sync {
    /// Unconditional insert.
    async fn put_item(&self, item: &InventoryItem) -> Result<()>;

    async fn query_page(
        &self,
        query: &KeyQuery,
        exclusive_start_key: Option<&ItemKey>,
        limit: Option<usize>,
    ) -> Result<Page>;

    /// Deleting an absent key is not an error.
    async fn delete_item(&self, key: &ItemKey) -> Result<()>;
}
