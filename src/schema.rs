//! Physical key layout of the inventory table.
//!
//! The base table is keyed by `(id, location_id)` and a global secondary
//! index mirrors it as `(location_id, id)`. Those two layouts decide which
//! lookups are cheap: point lookups by id, point lookups by the full pair,
//! and range lookups by location. Anything else needs a scan.

/// Partition key of the table, sort key of the location index.
pub const ID_ATTR: &str = "id";
/// Sort key of the table, partition key of the location index.
pub const LOCATION_ATTR: &str = "location_id";

pub const DEFAULT_TABLE_NAME: &str = "Inventory";
pub const DEFAULT_LOCATION_INDEX: &str = "location_id-id-index";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    String,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: &'static str,
    pub kind: AttributeKind,
}

impl KeyAttribute {
    pub const ID: KeyAttribute = KeyAttribute {
        name: ID_ATTR,
        kind: AttributeKind::String,
    };
    pub const LOCATION: KeyAttribute = KeyAttribute {
        name: LOCATION_ATTR,
        kind: AttributeKind::Number,
    };
}

/// A secondary index projecting every attribute of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSchema {
    pub name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: KeyAttribute,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub table_name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: KeyAttribute,
    pub location_index: IndexSchema,
}

impl TableSchema {
    /// The canonical inventory layout.
    pub fn inventory() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            partition_key: KeyAttribute::ID,
            sort_key: KeyAttribute::LOCATION,
            location_index: IndexSchema {
                name: DEFAULT_LOCATION_INDEX.to_string(),
                partition_key: KeyAttribute::LOCATION,
                sort_key: KeyAttribute::ID,
            },
        }
    }

    pub fn with_table_name(mut self, name: &str) -> Self {
        self.table_name = name.to_string();
        self
    }

    pub fn with_index_name(mut self, name: &str) -> Self {
        self.location_index.name = name.to_string();
        self
    }

    /// Every attribute that takes part in a key, without duplicates.
    pub fn key_attributes(&self) -> Vec<KeyAttribute> {
        let mut attrs = vec![self.partition_key, self.sort_key];
        for attr in [
            self.location_index.partition_key,
            self.location_index.sort_key,
        ] {
            if !attrs.contains(&attr) {
                attrs.push(attr);
            }
        }
        attrs
    }
}

impl Default for TableSchema {
    fn default() -> Self {
        Self::inventory()
    }
}

/// Full primary key of one item. The only key accepted for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    pub id: String,
    pub location_id: i64,
}

impl ItemKey {
    pub fn new(id: impl Into<String>, location_id: i64) -> Self {
        Self {
            id: id.into(),
            location_id,
        }
    }
}

/// An equality condition on a partition key, against the table or the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyQuery {
    /// Items whose table partition key equals the id.
    ById(String),
    /// Items whose index partition key equals the location.
    ByLocation(i64),
}

impl KeyQuery {
    pub fn partition_attribute(&self) -> &'static str {
        match self {
            KeyQuery::ById(_) => ID_ATTR,
            KeyQuery::ByLocation(_) => LOCATION_ATTR,
        }
    }

    /// Index to query, `None` for the base table.
    pub fn index_name<'a>(&self, schema: &'a TableSchema) -> Option<&'a str> {
        match self {
            KeyQuery::ById(_) => None,
            KeyQuery::ByLocation(_) => Some(schema.location_index.name.as_str()),
        }
    }

    pub fn matches(&self, key: &ItemKey) -> bool {
        match self {
            KeyQuery::ById(id) => key.id == *id,
            KeyQuery::ByLocation(location_id) => key.location_id == *location_id,
        }
    }
}
