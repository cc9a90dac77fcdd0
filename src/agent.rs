use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, AttributeValue, BillingMode, GlobalSecondaryIndex, KeySchemaElement,
    KeyType, Projection, ProjectionType, ScalarAttributeType,
};
use aws_sdk_dynamodb::Client;
use tracing::{debug, info};

use crate::backend::{InventoryBackend, Page};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::model::{parse_decimal, InventoryItem};
use crate::schema::{
    AttributeKind, ID_ATTR, ItemKey, KeyAttribute, KeyQuery, LOCATION_ATTR, TableSchema,
};

type AttributeMap = HashMap<String, AttributeValue>;

/// DynamoDB-backed inventory table.
pub struct DynamoAgent {
    pub client: Client,
    schema: TableSchema,
}

impl DynamoAgent {
    /// Builds a client from the default AWS provider chain, pointed at
    /// `endpoint_url` when one is configured (e.g. DynamoDB Local).
    pub async fn connect(config: &StoreConfig) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));
        if let Some(url) = &config.endpoint_url {
            loader = loader.endpoint_url(url);
        }
        let shared_config = loader.load().await;

        Self::from_client(Client::new(&shared_config), config.schema())
    }

    pub fn from_client(client: Client, schema: TableSchema) -> Self {
        Self { client, schema }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Creates the table and its location index when missing. Returns
    /// whether anything was created.
    pub async fn ensure_table(&self) -> Result<bool> {
        let schema = &self.schema;
        let index = &schema.location_index;
        let tables = self.client.list_tables().send().await?;
        if tables.table_names().contains(&schema.table_name) {
            debug!(table = %schema.table_name, "table already exists");
            return Ok(false);
        }

        let mut request = self
            .client
            .create_table()
            .table_name(&schema.table_name)
            .key_schema(key_element(schema.partition_key, KeyType::Hash)?)
            .key_schema(key_element(schema.sort_key, KeyType::Range)?)
            .global_secondary_indexes(
                GlobalSecondaryIndex::builder()
                    .index_name(&index.name)
                    .key_schema(key_element(index.partition_key, KeyType::Hash)?)
                    .key_schema(key_element(index.sort_key, KeyType::Range)?)
                    .projection(
                        Projection::builder()
                            .projection_type(ProjectionType::All)
                            .build(),
                    )
                    .build()?,
            )
            .billing_mode(BillingMode::PayPerRequest);

        for attr in schema.key_attributes() {
            request = request.attribute_definitions(
                AttributeDefinition::builder()
                    .attribute_name(attr.name)
                    .attribute_type(scalar_type(attr.kind))
                    .build()?,
            );
        }

        request.send().await?;
        info!(table = %schema.table_name, index = %index.name, "created table");
        Ok(true)
    }
}

#[async_trait]
impl InventoryBackend for DynamoAgent {
    async fn put_item(&self, item: &InventoryItem) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.schema.table_name)
            .set_item(Some(item_to_attributes(item)))
            .send()
            .await?;
        Ok(())
    }

    async fn query_page(
        &self,
        query: &KeyQuery,
        exclusive_start_key: Option<&ItemKey>,
        limit: Option<usize>,
    ) -> Result<Page> {
        let limit = limit
            .map(|n| i32::try_from(n).unwrap_or(i32::MAX))
            .filter(|n| *n > 0);

        let output = self
            .client
            .query()
            .table_name(&self.schema.table_name)
            .set_index_name(query.index_name(&self.schema).map(str::to_string))
            .key_condition_expression("#pk = :pk_val")
            .expression_attribute_names("#pk", query.partition_attribute())
            .expression_attribute_values(":pk_val", partition_value(query))
            .set_exclusive_start_key(exclusive_start_key.map(key_to_attributes))
            .set_limit(limit)
            .send()
            .await?;

        let items = output
            .items()
            .iter()
            .map(item_from_attributes)
            .collect::<Result<Vec<_>>>()?;
        let last_evaluated_key = output
            .last_evaluated_key()
            .map(key_from_attributes)
            .transpose()?;

        Ok(Page {
            items,
            last_evaluated_key,
        })
    }

    async fn delete_item(&self, key: &ItemKey) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.schema.table_name)
            .set_key(Some(key_to_attributes(key)))
            .send()
            .await?;
        Ok(())
    }
}

fn key_element(attr: KeyAttribute, key_type: KeyType) -> Result<KeySchemaElement> {
    Ok(KeySchemaElement::builder()
        .attribute_name(attr.name)
        .key_type(key_type)
        .build()?)
}

fn scalar_type(kind: AttributeKind) -> ScalarAttributeType {
    match kind {
        AttributeKind::String => ScalarAttributeType::S,
        AttributeKind::Number => ScalarAttributeType::N,
    }
}

fn partition_value(query: &KeyQuery) -> AttributeValue {
    match query {
        KeyQuery::ById(id) => AttributeValue::S(id.clone()),
        KeyQuery::ByLocation(location_id) => AttributeValue::N(location_id.to_string()),
    }
}

fn key_to_attributes(key: &ItemKey) -> AttributeMap {
    HashMap::from([
        (ID_ATTR.to_string(), AttributeValue::S(key.id.clone())),
        (
            LOCATION_ATTR.to_string(),
            AttributeValue::N(key.location_id.to_string()),
        ),
    ])
}

fn key_from_attributes(attrs: &AttributeMap) -> Result<ItemKey> {
    Ok(ItemKey {
        id: get_string(attrs, ID_ATTR)?,
        location_id: get_number(attrs, LOCATION_ATTR)?,
    })
}

// Numbers travel as their decimal text, so price never passes through f64.
fn item_to_attributes(item: &InventoryItem) -> AttributeMap {
    let mut attrs = key_to_attributes(&item.key());
    attrs.insert("name".to_string(), AttributeValue::S(item.name.clone()));
    attrs.insert(
        "description".to_string(),
        AttributeValue::S(item.description.clone()),
    );
    attrs.insert(
        "qty_on_hand".to_string(),
        AttributeValue::N(item.qty_on_hand.to_string()),
    );
    attrs.insert("price".to_string(), AttributeValue::N(item.price.to_string()));
    attrs
}

fn item_from_attributes(attrs: &AttributeMap) -> Result<InventoryItem> {
    let price = get_n(attrs, "price")?;
    Ok(InventoryItem {
        id: get_string(attrs, ID_ATTR)?,
        name: get_string(attrs, "name")?,
        description: get_string(attrs, "description")?,
        qty_on_hand: get_number(attrs, "qty_on_hand")?,
        price: parse_decimal(price).ok_or_else(|| {
            StoreError::Deserialization(format!("price is not a decimal: {price}"))
        })?,
        location_id: get_number(attrs, LOCATION_ATTR)?,
    })
}

fn get_string(attrs: &AttributeMap, key: &str) -> Result<String> {
    attrs
        .get(key)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| StoreError::Deserialization(format!("missing string attribute {key}")))
}

fn get_n<'a>(attrs: &'a AttributeMap, key: &str) -> Result<&'a str> {
    attrs
        .get(key)
        .and_then(|v| v.as_n().ok())
        .map(String::as_str)
        .ok_or_else(|| StoreError::Deserialization(format!("missing number attribute {key}")))
}

fn get_number<T: std::str::FromStr>(attrs: &AttributeMap, key: &str) -> Result<T> {
    let raw = get_n(attrs, key)?;
    raw.parse()
        .map_err(|_| StoreError::Deserialization(format!("{key} is out of range: {raw}")))
}
