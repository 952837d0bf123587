//! Local file source
//!
//! Reads a file under the engine's `data` folder through the `dfs`
//! connection. All reading and validation is done by the query engine.

use super::framework::{Source, SourceConfig, SourceFactory, required_string_field, string_field};
use crate::Result;
use crate::engine::{self, Credentials, QueryEngine, Row, TableRef, ValidationResult};
use crate::schema::{FieldType, ProtocolSchema, SchemaField};
use serde_json::json;
use std::sync::Arc;

/// Column used for row identity when the config names none
pub const UNIQUE_ID_DEFAULT: &str = "id";

/// Backend connection serving local files
pub const CONNECTION_NAME: &str = "dfs";

/// Typed view of a `local_file` configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileConfig {
    /// Path relative to the `data` folder
    pub location: String,
    /// Row identity column, `"id"` unless configured
    pub unique_id: String,
}

impl LocalFileConfig {
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        let name = LocalFileSource::NAME;
        Ok(Self {
            location: required_string_field(name, config, "location")?,
            unique_id: string_field(name, config, "unique_id")?.unwrap_or_else(|| UNIQUE_ID_DEFAULT.to_string()),
        })
    }
}

/// Source adapter for file-backed datasets
pub struct LocalFileSource {
    config: SourceConfig,
    connection_name: &'static str,
    path: String,
    unique_id: String,
    engine: Arc<dyn QueryEngine>,
}

impl LocalFileSource {
    pub fn new(config: SourceConfig, engine: Arc<dyn QueryEngine>) -> Result<Self> {
        let LocalFileConfig { location, unique_id } = LocalFileConfig::from_config(&config)?;
        let path = TableRef::data_file(CONNECTION_NAME, &location).to_string();

        Ok(Self {
            config,
            connection_name: CONNECTION_NAME,
            path,
            unique_id,
            engine,
        })
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub fn connection_name(&self) -> &str {
        self.connection_name
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }
}

impl Source for LocalFileSource {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn path(&self) -> &str {
        &self.path
    }

    // File-system access needs no credentials; they are accepted and ignored.
    fn get_data(
        &self,
        fields: &[String],
        offset: i64,
        limit: i64,
        _reusable_credentials: Option<&[Credentials]>,
    ) -> engine::Result<Vec<Row>> {
        self.engine.read(&self.path, fields, offset, limit, &self.unique_id)
    }

    fn validate(&self) -> ValidationResult {
        self.engine.validate(&self.path)
    }
}

impl SourceFactory for LocalFileSource {
    const NAME: &'static str = "local_file";

    fn schema() -> ProtocolSchema {
        ProtocolSchema::new(
            Self::NAME,
            vec![
                SchemaField::required(
                    "location",
                    FieldType::String,
                    "The path to your local file, relative to the container 'data' folder.",
                ),
                SchemaField::optional(
                    "unique_id",
                    FieldType::String,
                    format!(
                        "Unique id column name to be used by local file engine. Defaults to '{}' when nothing is provided.",
                        UNIQUE_ID_DEFAULT
                    ),
                    Some(json!(UNIQUE_ID_DEFAULT)),
                ),
            ],
        )
    }

    fn construct(config: SourceConfig, engine: Arc<dyn QueryEngine>) -> Result<Self> {
        Self::new(config, engine)
    }
}
