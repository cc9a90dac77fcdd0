use serde_derive::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::backend::InventoryBackend;
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::model::{parse_location_id, CreateItemRequest, IdGenerator, InventoryItem, UuidV7Ids};
use crate::paginate::{drain_pages, PageLimits};
use crate::schema::KeyQuery;

/// What to do when one id resolves to more than one item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateIdPolicy {
    /// Log and use the first match.
    #[default]
    Warn,
    /// Fail with [`StoreError::DuplicateId`].
    Reject,
}

/// Every item at one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationItems {
    pub location_id: i64,
    pub items: Vec<InventoryItem>,
}

impl LocationItems {
    pub fn count(&self) -> usize {
        self.items.len()
    }
}

/// The inventory operations over an injected backend.
///
/// Holds no mutable state; share it behind an `Arc` across request tasks.
pub struct InventoryStore<B, G = UuidV7Ids> {
    backend: B,
    ids: G,
    limits: PageLimits,
    page_size: Option<usize>,
    duplicates: DuplicateIdPolicy,
}

impl<B: InventoryBackend> InventoryStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            ids: UuidV7Ids,
            limits: PageLimits::default(),
            page_size: None,
            duplicates: DuplicateIdPolicy::default(),
        }
    }

    pub fn from_config(backend: B, config: &StoreConfig) -> Self {
        Self::new(backend)
            .with_limits(config.page_limits())
            .with_page_size(config.page_size)
            .with_duplicate_policy(config.duplicate_ids)
    }
}

impl<B: InventoryBackend, G: IdGenerator> InventoryStore<B, G> {
    pub fn with_id_generator<H: IdGenerator>(self, ids: H) -> InventoryStore<B, H> {
        InventoryStore {
            backend: self.backend,
            ids,
            limits: self.limits,
            page_size: self.page_size,
            duplicates: self.duplicates,
        }
    }

    pub fn with_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Per-request page size for index queries. `None` leaves it to the backend.
    pub fn with_page_size(mut self, page_size: Option<usize>) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicateIdPolicy) -> Self {
        self.duplicates = policy;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Validates the request, assigns a fresh id and writes the item.
    #[instrument(skip_all)]
    pub async fn create(&self, request: &CreateItemRequest) -> Result<InventoryItem> {
        let new_item = request.validate()?;
        let item = new_item.with_id(self.ids.next_id());

        self.backend.put_item(&item).await?;
        info!(item_id = %item.id, location_id = item.location_id, "created inventory item");
        Ok(item)
    }

    /// First item whose partition key is `id`.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: &str) -> Result<InventoryItem> {
        self.resolve(id).await
    }

    /// Every item at a location given as caller text, e.g. a path segment.
    #[instrument(skip(self))]
    pub async fn get_by_location(&self, location: &str) -> Result<LocationItems> {
        let location_id = parse_location_id(location)?;
        self.get_by_location_id(location_id).await
    }

    pub async fn get_by_location_id(&self, location_id: i64) -> Result<LocationItems> {
        let query = &KeyQuery::ByLocation(location_id);
        let items = drain_pages(self.limits, move |start| async move {
            self.backend
                .query_page(query, start.as_ref(), self.page_size)
                .await
        })
        .await?;

        info!(location_id, count = items.len(), "retrieved location items");
        Ok(LocationItems { location_id, items })
    }

    /// Resolves the full key of `id`, then deletes by it.
    ///
    /// The two calls are not atomic. If a concurrent caller removes the
    /// item in between, the delete is a no-op and this still returns the
    /// item as it was read.
    #[instrument(skip(self))]
    pub async fn delete_by_id(&self, id: &str) -> Result<InventoryItem> {
        let item = self.resolve(id).await?;
        self.backend.delete_item(&item.key()).await?;
        info!(item_id = %item.id, location_id = item.location_id, "deleted inventory item");
        Ok(item)
    }

    async fn resolve(&self, id: &str) -> Result<InventoryItem> {
        if id.trim().is_empty() {
            return Err(StoreError::validation("Missing item ID"));
        }

        // an id is expected to match a single item, so the first page is enough
        let query = KeyQuery::ById(id.to_string());
        let page = self.backend.query_page(&query, None, None).await?;
        let mut matches = page.items.len();

        let mut items = page.items.into_iter();
        let Some(first) = items.next() else {
            return Err(StoreError::NotFound(id.to_string()));
        };

        // a full page of one may still be the only match
        if matches == 1 {
            if let Some(start) = page.last_evaluated_key {
                let next = self.backend.query_page(&query, Some(&start), Some(1)).await?;
                matches += next.items.len();
            }
        }

        if matches > 1 {
            match self.duplicates {
                DuplicateIdPolicy::Warn => {
                    warn!(
                        item_id = id,
                        matches,
                        "id resolves to several items, using the first"
                    )
                }
                DuplicateIdPolicy::Reject => {
                    return Err(StoreError::DuplicateId {
                        id: id.to_string(),
                        matches,
                    });
                }
            }
        }
        Ok(first)
    }
}
