//! Inventory records in a DynamoDB table keyed by `(id, location_id)`,
//! with a `(location_id, id)` index for lookups by location.

pub mod agent;
pub mod backend;
pub mod config;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod model;
pub mod paginate;
pub mod schema;
pub mod store;
pub mod telemetry;

pub use agent::DynamoAgent;
pub use backend::{InventoryBackend, Page};
pub use crate::config::StoreConfig;
pub use error::{ErrorKind, Result, StoreError};
pub use memory::MemoryBackend;
pub use model::{CreateItemRequest, IdGenerator, InventoryItem, NewInventoryItem, UuidV7Ids};
pub use paginate::PageLimits;
pub use schema::{ItemKey, KeyQuery, TableSchema};
pub use store::{DuplicateIdPolicy, InventoryStore, LocationItems};
