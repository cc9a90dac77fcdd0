use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_derive::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::schema::ItemKey;

/// One stock record. `(id, location_id)` is its primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub qty_on_hand: u64,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub price: Decimal,
    pub location_id: i64,
}

impl InventoryItem {
    pub fn key(&self) -> ItemKey {
        ItemKey::new(self.id.clone(), self.location_id)
    }
}

/// A validated create request, everything but the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInventoryItem {
    pub name: String,
    pub description: String,
    pub qty_on_hand: u64,
    pub price: Decimal,
    pub location_id: i64,
}

impl NewInventoryItem {
    pub fn with_id(self, id: String) -> InventoryItem {
        InventoryItem {
            id,
            name: self.name,
            description: self.description,
            qty_on_hand: self.qty_on_hand,
            price: self.price,
            location_id: self.location_id,
        }
    }
}

pub const REQUIRED_FIELDS: [&str; 5] =
    ["name", "description", "qty_on_hand", "price", "location_id"];

/// Raw create body as sent by a caller. A field that is absent or `null`
/// is missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateItemRequest {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default)]
    pub qty_on_hand: Option<Value>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub location_id: Option<Value>,
}

impl CreateItemRequest {
    pub fn from_value(body: Value) -> Result<Self> {
        if !body.is_object() {
            return Err(StoreError::validation("Request body must be a JSON object"));
        }
        serde_json::from_value(body).map_err(|e| StoreError::validation(e.to_string()))
    }

    fn field(&self, name: &str) -> Option<&Value> {
        match name {
            "name" => self.name.as_ref(),
            "description" => self.description.as_ref(),
            "qty_on_hand" => self.qty_on_hand.as_ref(),
            "price" => self.price.as_ref(),
            "location_id" => self.location_id.as_ref(),
            _ => None,
        }
    }

    pub fn missing_fields(&self) -> Vec<String> {
        REQUIRED_FIELDS
            .iter()
            .filter(|field| self.field(field).is_none())
            .map(|field| field.to_string())
            .collect()
    }

    /// Checks presence of every field first, then coerces each one.
    pub fn validate(&self) -> Result<NewInventoryItem> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(StoreError::MissingFields(missing));
        }
        let (Some(name), Some(description), Some(qty), Some(price), Some(location)) = (
            &self.name,
            &self.description,
            &self.qty_on_hand,
            &self.price,
            &self.location_id,
        ) else {
            return Err(StoreError::MissingFields(self.missing_fields()));
        };

        let name = as_string("name", name)?;
        if name.trim().is_empty() {
            return Err(StoreError::validation("name must be a non-empty string"));
        }

        Ok(NewInventoryItem {
            name,
            description: as_string("description", description)?,
            qty_on_hand: as_quantity(qty)?,
            price: as_price(price)?,
            location_id: as_location(location)?,
        })
    }
}

fn as_string(field: &str, value: &Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| StoreError::validation(format!("{field} must be a string")))
}

fn as_quantity(value: &Value) -> Result<u64> {
    let qty = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            parse_decimal(&n.to_string())
                .filter(|d| d.fract().is_zero())
                .and_then(|d| d.to_u64())
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    qty.ok_or_else(|| StoreError::validation("qty_on_hand must be a non-negative integer"))
}

fn as_price(value: &Value) -> Result<Decimal> {
    let price = match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    };
    price.ok_or_else(|| StoreError::validation("price must be a number"))
}

/// Parses an integer location id as supplied in a body or a path.
pub fn parse_location_id(text: &str) -> Result<i64> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| StoreError::validation("Location ID must be an integer"))
}

fn as_location(value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| StoreError::validation("Location ID must be an integer")),
        Value::String(s) => parse_location_id(s),
        _ => Err(StoreError::validation("Location ID must be an integer")),
    }
}

pub(crate) fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// Source of fresh item ids.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// UUIDv7 ids. The hyphenated form is fixed width and time-ordered, so
/// lexical order follows creation order.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidV7Ids;

impl IdGenerator for UuidV7Ids {
    fn next_id(&self) -> String {
        Uuid::now_v7().to_string()
    }
}
