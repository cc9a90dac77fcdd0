//! Request handlers wrapping each store operation in a status code and a
//! JSON body carrying a human-readable `message`.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::error;

use crate::backend::InventoryBackend;
use crate::error::{ErrorKind, StoreError};
use crate::model::{CreateItemRequest, IdGenerator};
use crate::store::InventoryStore;

pub const STATUS_OK: u16 = 200;
pub const STATUS_CREATED: u16 = 201;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_NOT_FOUND: u16 = 404;
pub const STATUS_SERVER_ERROR: u16 = 500;

const DEFAULT_HEADERS: [(&str, &str); 2] = [
    ("Content-Type", "application/json"),
    ("Access-Control-Allow-Origin", "*"),
];

#[derive(Debug, Clone, Default)]
pub struct Request {
    pub path_parameters: HashMap<String, String>,
    pub body: Option<String>,
}

impl Request {
    pub fn with_path_id(id: impl Into<String>) -> Self {
        Self {
            path_parameters: HashMap::from([("id".to_string(), id.into())]),
            body: None,
        }
    }

    pub fn with_body(body: impl Into<String>) -> Self {
        Self {
            path_parameters: HashMap::new(),
            body: Some(body.into()),
        }
    }

    fn path_id(&self) -> Option<&str> {
        self.path_parameters
            .get("id")
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Value,
}

impl Response {
    pub fn json(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: DEFAULT_HEADERS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body,
        }
    }

    fn message(status: u16, message: impl Into<String>) -> Self {
        Self::json(status, json!({ "message": message.into() }))
    }

    /// Client errors carry the error text as the message. Everything else
    /// collapses into a server error with the detail under `error`.
    fn from_error(err: &StoreError, server_message: &str) -> Self {
        match err.kind() {
            ErrorKind::Validation => Self::message(STATUS_BAD_REQUEST, err.to_string()),
            ErrorKind::NotFound => Self::message(STATUS_NOT_FOUND, err.to_string()),
            ErrorKind::Backend | ErrorKind::ResourceExhausted => {
                error!(error = %err, "{server_message}");
                Self::json(
                    STATUS_SERVER_ERROR,
                    json!({ "message": server_message, "error": err.to_string() }),
                )
            }
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, StoreError> {
    serde_json::to_value(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

/// `POST /item`
pub async fn create_item<B, G>(store: &InventoryStore<B, G>, request: Request) -> Response
where
    B: InventoryBackend,
    G: IdGenerator,
{
    const FAILED: &str = "Error creating inventory item";

    let body = match request.body.as_deref() {
        Some(text) => match serde_json::from_str::<Value>(text) {
            Ok(body) => body,
            Err(_) => {
                return Response::message(STATUS_BAD_REQUEST, "Invalid JSON in request body");
            }
        },
        None => json!({}),
    };

    let result = async {
        let create = CreateItemRequest::from_value(body)?;
        let item = store.create(&create).await?;
        to_json(&item)
    }
    .await;

    match result {
        Ok(item) => Response::json(
            STATUS_CREATED,
            json!({ "message": "Successfully created inventory item", "item": item }),
        ),
        Err(err) => Response::from_error(&err, FAILED),
    }
}

/// `GET /item/{id}`
pub async fn get_item<B, G>(store: &InventoryStore<B, G>, request: Request) -> Response
where
    B: InventoryBackend,
    G: IdGenerator,
{
    const FAILED: &str = "Error retrieving inventory item";

    let Some(id) = request.path_id() else {
        return Response::message(STATUS_BAD_REQUEST, "Missing item ID in path parameters");
    };

    match store.get_by_id(id).await.and_then(|item| to_json(&item)) {
        Ok(item) => Response::json(
            STATUS_OK,
            json!({ "message": "Successfully retrieved inventory item", "item": item }),
        ),
        Err(err) => Response::from_error(&err, FAILED),
    }
}

/// `GET /location/{id}`
pub async fn get_location_items<B, G>(store: &InventoryStore<B, G>, request: Request) -> Response
where
    B: InventoryBackend,
    G: IdGenerator,
{
    const FAILED: &str = "Error retrieving inventory items for location";

    let Some(location) = request.path_id() else {
        return Response::message(STATUS_BAD_REQUEST, "Missing location ID in path parameters");
    };

    let result = async {
        let found = store.get_by_location(location).await?;
        let items = to_json(&found.items)?;
        Ok::<_, StoreError>((found.location_id, found.count(), items))
    }
    .await;

    match result {
        Ok((location_id, count, items)) => Response::json(
            STATUS_OK,
            json!({
                "message": format!(
                    "Successfully retrieved inventory items for location {location_id}"
                ),
                "location_id": location_id,
                "count": count,
                "items": items,
            }),
        ),
        Err(err) => Response::from_error(&err, FAILED),
    }
}

/// `DELETE /item/{id}`
pub async fn delete_item<B, G>(store: &InventoryStore<B, G>, request: Request) -> Response
where
    B: InventoryBackend,
    G: IdGenerator,
{
    const FAILED: &str = "Error deleting inventory item";

    let Some(id) = request.path_id() else {
        return Response::message(STATUS_BAD_REQUEST, "Missing item ID in path parameters");
    };

    match store.delete_by_id(id).await.and_then(|item| to_json(&item)) {
        Ok(item) => Response::json(
            STATUS_OK,
            json!({
                "message": format!("Successfully deleted inventory item with ID {id}"),
                "deleted_item": item,
            }),
        ),
        Err(err) => Response::from_error(&err, FAILED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn responses_carry_json_and_cors_headers() {
        let response = Response::message(STATUS_OK, "ok");
        assert_eq!(response.headers["Content-Type"], "application/json");
        assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
        assert!(response.is_success());
    }

    #[test]
    fn server_errors_hide_behind_a_generic_message() {
        let response = Response::from_error(&StoreError::backend("throttled"), "Error x");
        assert_eq!(response.status, STATUS_SERVER_ERROR);
        assert_eq!(response.body["message"], "Error x");
        assert!(response.body["error"].as_str().unwrap().contains("throttled"));

        let exhausted = StoreError::PaginationExhausted { pages: 9 };
        let response = Response::from_error(&exhausted, "Error x");
        assert_eq!(response.status, STATUS_SERVER_ERROR);
    }

    #[test]
    fn empty_path_id_is_missing() {
        assert_eq!(Request::with_path_id("").path_id(), None);
        assert_eq!(Request::with_path_id("a").path_id(), Some("a"));
    }
}
