//! Runtime settings, read from `config/inventory.toml` (optional) and
//! `INVENTORY__*` environment variables, e.g. `INVENTORY__TABLE_NAME`.

use std::time::Duration;

use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use config::builder::DefaultState;
use serde_derive::Deserialize;

use crate::paginate::{PageLimits, DEFAULT_MAX_PAGES};
use crate::schema::{TableSchema, DEFAULT_LOCATION_INDEX, DEFAULT_TABLE_NAME};
use crate::store::DuplicateIdPolicy;

const CONFIG_FILE: &str = "config/inventory";
const ENV_PREFIX: &str = "INVENTORY";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_table_name")]
    pub table_name: String,
    #[serde(default = "default_location_index")]
    pub location_index: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// `http://localhost:8000` for DynamoDB Local.
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub page_size: Option<usize>,
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    #[serde(default = "default_max_drain_millis")]
    pub max_drain_millis: u64,
    #[serde(default)]
    pub duplicate_ids: DuplicateIdPolicy,
    #[serde(default)]
    pub json_logs: bool,
}

fn default_table_name() -> String {
    DEFAULT_TABLE_NAME.to_string()
}

fn default_location_index() -> String {
    DEFAULT_LOCATION_INDEX.to_string()
}

fn default_region() -> String {
    "us-west-2".to_string()
}

fn default_max_pages() -> usize {
    DEFAULT_MAX_PAGES
}

fn default_max_drain_millis() -> u64 {
    30_000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table_name: default_table_name(),
            location_index: default_location_index(),
            region: default_region(),
            endpoint_url: None,
            page_size: None,
            max_pages: default_max_pages(),
            max_drain_millis: default_max_drain_millis(),
            duplicate_ids: DuplicateIdPolicy::default(),
            json_logs: false,
        }
    }
}

impl StoreConfig {
    /// Loads the file if present, then lets the environment override it.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name(CONFIG_FILE).required(false))
                .add_source(
                    Environment::with_prefix(ENV_PREFIX)
                        .prefix_separator("__")
                        .separator("__")
                        .try_parsing(true),
                ),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }

    pub fn schema(&self) -> TableSchema {
        TableSchema::inventory()
            .with_table_name(&self.table_name)
            .with_index_name(&self.location_index)
    }

    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            max_pages: self.max_pages.max(1),
            max_elapsed: Duration::from_millis(self.max_drain_millis),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn empty_sources_give_defaults() {
        let config = StoreConfig::from_builder(Config::builder()).unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.schema(), TableSchema::inventory());
    }

    #[test]
    fn toml_overrides_defaults() {
        let builder = Config::builder().add_source(File::from_str(
            r#"
            table_name = "InventoryTest"
            endpoint_url = "http://localhost:8000"
            page_size = 25
            max_pages = 0
            duplicate_ids = "reject"
            "#,
            FileFormat::Toml,
        ));
        let config = StoreConfig::from_builder(builder).unwrap();

        assert_eq!(config.schema().table_name, "InventoryTest");
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(config.page_size, Some(25));
        assert_eq!(config.duplicate_ids, DuplicateIdPolicy::Reject);
        assert_eq!(config.page_limits().max_pages, 1);
    }
}
