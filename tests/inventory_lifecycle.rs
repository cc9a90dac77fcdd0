use std::collections::HashSet;
use std::str::FromStr;

use async_trait::async_trait;
use inventory_store::handlers::{self, Request};
use inventory_store::{
    InventoryBackend, InventoryItem, InventoryStore, ItemKey, KeyQuery, MemoryBackend, Page,
    StoreError,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};

fn bolt_body(location_id: i64) -> String {
    json!({
        "name": "Bolt",
        "description": "M6",
        "qty_on_hand": 100,
        "price": 0.25,
        "location_id": location_id,
    })
    .to_string()
}

fn price_of(item: &Value) -> Decimal {
    Decimal::from_str(&item["price"].to_string()).unwrap()
}

#[tokio::test]
async fn bolt_scenario_end_to_end() {
    let store = InventoryStore::new(MemoryBackend::with_page_size(2));

    let created = handlers::create_item(&store, Request::with_body(bolt_body(7))).await;
    assert_eq!(created.status, 201);
    let item = &created.body["item"];
    assert_eq!(item["qty_on_hand"], json!(100));
    assert_eq!(price_of(item), Decimal::new(25, 2));
    let id = item["id"].as_str().unwrap().to_string();

    let at_seven = handlers::get_location_items(&store, Request::with_path_id("7")).await;
    assert_eq!(at_seven.status, 200);
    assert_eq!(at_seven.body["count"], json!(1));
    assert_eq!(at_seven.body["location_id"], json!(7));
    assert_eq!(at_seven.body["items"][0], *item);

    let deleted = handlers::delete_item(&store, Request::with_path_id(&id)).await;
    assert_eq!(deleted.status, 200);
    assert_eq!(deleted.body["deleted_item"]["location_id"], json!(7));
    assert_eq!(
        deleted.body["message"],
        json!(format!("Successfully deleted inventory item with ID {id}"))
    );

    let gone = handlers::get_item(&store, Request::with_path_id(&id)).await;
    assert_eq!(gone.status, 404);
    assert_eq!(gone.body["message"], json!(format!("Item with ID {id} not found")));
}

#[tokio::test]
async fn created_ids_are_unique_and_fetchable() {
    let store = InventoryStore::new(MemoryBackend::new());
    let mut ids = HashSet::new();

    for location_id in 0..20 {
        let request = Request::with_body(bolt_body(location_id));
        let created = handlers::create_item(&store, request).await;
        let item = created.body["item"].clone();
        let id = item["id"].as_str().unwrap().to_string();
        assert!(!id.is_empty());
        assert!(ids.insert(id.clone()));

        let fetched = handlers::get_item(&store, Request::with_path_id(&id)).await;
        assert_eq!(fetched.status, 200);
        assert_eq!(fetched.body["item"], item);
    }
}

#[tokio::test]
async fn create_reports_all_missing_fields() {
    let store = InventoryStore::new(MemoryBackend::new());

    let response = handlers::create_item(
        &store,
        Request::with_body(json!({ "description": "x", "qty_on_hand": 1 }).to_string()),
    )
    .await;
    assert_eq!(response.status, 400);
    assert_eq!(
        response.body["message"],
        "Missing required fields: name, price, location_id"
    );

    let empty = handlers::create_item(&store, Request::default()).await;
    assert_eq!(empty.status, 400);
    assert_eq!(
        empty.body["message"],
        "Missing required fields: name, description, qty_on_hand, price, location_id"
    );
    assert!(store.backend().is_empty().unwrap());
}

#[tokio::test]
async fn create_rejects_malformed_json() {
    let store = InventoryStore::new(MemoryBackend::new());
    let response = handlers::create_item(&store, Request::with_body("{not json")).await;
    assert_eq!(response.status, 400);
    assert_eq!(response.body["message"], "Invalid JSON in request body");
}

#[tokio::test]
async fn path_parameters_are_validated() {
    let store = InventoryStore::new(MemoryBackend::new());

    let missing = handlers::get_item(&store, Request::default()).await;
    assert_eq!(missing.status, 400);
    assert_eq!(missing.body["message"], "Missing item ID in path parameters");

    let missing = handlers::delete_item(&store, Request::default()).await;
    assert_eq!(missing.status, 400);

    let missing = handlers::get_location_items(&store, Request::default()).await;
    assert_eq!(missing.body["message"], "Missing location ID in path parameters");

    let bad = handlers::get_location_items(&store, Request::with_path_id("seven")).await;
    assert_eq!(bad.status, 400);
    assert_eq!(bad.body["message"], "Location ID must be an integer");
}

#[tokio::test]
async fn delete_of_unknown_id_is_not_found() {
    let store = InventoryStore::new(MemoryBackend::new());
    let response = handlers::delete_item(&store, Request::with_path_id("missing")).await;
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn location_results_span_many_pages_without_duplicates() {
    let store = InventoryStore::new(MemoryBackend::with_page_size(3));
    for _ in 0..10 {
        handlers::create_item(&store, Request::with_body(bolt_body(5))).await;
    }
    for _ in 0..4 {
        handlers::create_item(&store, Request::with_body(bolt_body(6))).await;
    }

    let response = handlers::get_location_items(&store, Request::with_path_id("5")).await;
    assert_eq!(response.body["count"], json!(10));
    let items = response.body["items"].as_array().unwrap();
    let ids: HashSet<&str> = items.iter().map(|i| i["id"].as_str().unwrap()).collect();
    assert_eq!(ids.len(), 10);
    assert!(items.iter().all(|i| i["location_id"] == json!(5)));

    let empty = handlers::get_location_items(&store, Request::with_path_id("99")).await;
    assert_eq!(empty.status, 200);
    assert_eq!(empty.body["count"], json!(0));
}

/// Removes an item right after it is read, as a concurrent delete would.
struct RacingBackend {
    inner: MemoryBackend,
}

#[async_trait]
impl InventoryBackend for RacingBackend {
    async fn put_item(&self, item: &InventoryItem) -> inventory_store::Result<()> {
        self.inner.put_item(item).await
    }

    async fn query_page(
        &self,
        query: &KeyQuery,
        exclusive_start_key: Option<&ItemKey>,
        limit: Option<usize>,
    ) -> inventory_store::Result<Page> {
        let page = self.inner.query_page(query, exclusive_start_key, limit).await?;
        for item in &page.items {
            self.inner.delete_item(&item.key()).await?;
        }
        Ok(page)
    }

    async fn delete_item(&self, key: &ItemKey) -> inventory_store::Result<()> {
        self.inner.delete_item(key).await
    }
}

#[tokio::test]
async fn delete_reports_the_read_item_when_a_concurrent_delete_wins() {
    let store = InventoryStore::new(RacingBackend {
        inner: MemoryBackend::new(),
    });
    let created = handlers::create_item(&store, Request::with_body(bolt_body(2))).await;
    let id = created.body["item"]["id"].as_str().unwrap().to_string();

    let deleted = store.delete_by_id(&id).await.unwrap();
    assert_eq!(deleted.id, id);
    assert!(store.backend().inner.is_empty().unwrap());
}

struct FailingBackend;

#[async_trait]
impl InventoryBackend for FailingBackend {
    async fn put_item(&self, _item: &InventoryItem) -> inventory_store::Result<()> {
        Err(StoreError::backend("ProvisionedThroughputExceededException"))
    }

    async fn query_page(
        &self,
        _query: &KeyQuery,
        _exclusive_start_key: Option<&ItemKey>,
        _limit: Option<usize>,
    ) -> inventory_store::Result<Page> {
        Err(StoreError::backend("connection reset"))
    }

    async fn delete_item(&self, _key: &ItemKey) -> inventory_store::Result<()> {
        Err(StoreError::backend("connection reset"))
    }
}

#[tokio::test]
async fn backend_failures_become_server_errors() {
    let store = InventoryStore::new(FailingBackend);

    let created = handlers::create_item(&store, Request::with_body(bolt_body(1))).await;
    assert_eq!(created.status, 500);
    assert_eq!(created.body["message"], "Error creating inventory item");
    assert!(
        created.body["error"]
            .as_str()
            .unwrap()
            .contains("ProvisionedThroughputExceededException")
    );

    let fetched = handlers::get_item(&store, Request::with_path_id("a")).await;
    assert_eq!(fetched.status, 500);
    assert_eq!(fetched.body["message"], "Error retrieving inventory item");

    let located = handlers::get_location_items(&store, Request::with_path_id("1")).await;
    assert_eq!(
        located.body["message"],
        "Error retrieving inventory items for location"
    );

    let deleted = handlers::delete_item(&store, Request::with_path_id("a")).await;
    assert_eq!(deleted.body["message"], "Error deleting inventory item");
}
