//! Core source framework
//!
//! Defines the traits all source adapters implement and the registry that
//! builds them by name from raw configuration.

use crate::engine::{self, Credentials, QueryEngine, Row, ValidationResult};
use crate::schema::ProtocolSchema;
use crate::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Raw adapter configuration, as supplied by the user
pub type SourceConfig = serde_json::Map<String, Value>;

/// Uniform read/validate interface over one backend kind
///
/// Adapters are immutable after construction and may be shared across
/// threads; all mutable work happens inside the query engine.
pub trait Source: Send + Sync {
    /// Adapter name, as registered
    fn name(&self) -> &str;

    /// Backend table reference this source reads from
    fn path(&self) -> &str;

    /// Read up to `limit` rows starting at `offset`, projected to `fields`.
    ///
    /// Engine failures are returned exactly as the engine reported them.
    fn get_data(
        &self,
        fields: &[String],
        offset: i64,
        limit: i64,
        reusable_credentials: Option<&[Credentials]>,
    ) -> engine::Result<Vec<Row>>;

    /// Pre-flight check that the source is reachable
    fn validate(&self) -> ValidationResult;
}

/// Static side of an adapter: its name, schema and constructor
pub trait SourceFactory: Source + Sized + 'static {
    const NAME: &'static str;

    /// Configuration contract; pure and identical on every call
    fn schema() -> ProtocolSchema;

    /// Build the adapter from configuration
    fn construct(config: SourceConfig, engine: Arc<dyn QueryEngine>) -> Result<Self>;
}

type Constructor = fn(SourceConfig, Arc<dyn QueryEngine>) -> Result<Box<dyn Source>>;

struct Registration {
    schema: fn() -> ProtocolSchema,
    construct: Constructor,
}

fn construct_boxed<S: SourceFactory>(config: SourceConfig, engine: Arc<dyn QueryEngine>) -> Result<Box<dyn Source>> {
    Ok(Box::new(S::construct(config, engine)?))
}

/// Registry of source adapters, keyed by name
#[derive(Default)]
pub struct SourceRegistry {
    sources: BTreeMap<&'static str, Registration>,
}

impl SourceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter type
    pub fn register<S: SourceFactory>(&mut self) {
        self.sources.insert(
            S::NAME,
            Registration {
                schema: S::schema,
                construct: construct_boxed::<S>,
            },
        );
    }

    /// Registered adapter names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        self.sources.keys().copied().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    /// Schema of a registered adapter
    pub fn schema(&self, name: &str) -> Result<ProtocolSchema> {
        self.sources
            .get(name)
            .map(|r| (r.schema)())
            .ok_or_else(|| Error::UnknownSource(name.to_string()))
    }

    /// Validate `config` against the adapter's schema, then construct it
    pub fn create(&self, name: &str, config: &SourceConfig, engine: Arc<dyn QueryEngine>) -> Result<Box<dyn Source>> {
        let registration = self
            .sources
            .get(name)
            .ok_or_else(|| Error::UnknownSource(name.to_string()))?;

        let resolved = (registration.schema)().apply(config)?;
        let source = (registration.construct)(resolved, engine)?;
        tracing::info!("Created source '{}' reading {}", name, source.path());
        Ok(source)
    }
}

/// Create a default registry with all built-in adapters
pub fn default_registry() -> SourceRegistry {
    let mut registry = SourceRegistry::new();
    registry.register::<super::local_file::LocalFileSource>();
    registry
}

/// Read an optional string field; `null` counts as absent
pub fn string_field(source_name: &str, config: &SourceConfig, field: &str) -> Result<Option<String>> {
    match config.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(Error::InvalidField {
            source_name: source_name.to_string(),
            field: field.to_string(),
            reason: format!("expected string, got {}", other),
        }),
    }
}

/// Read a required string field
pub fn required_string_field(source_name: &str, config: &SourceConfig, field: &str) -> Result<String> {
    string_field(source_name, config, field)?.ok_or_else(|| Error::MissingField {
        source_name: source_name.to_string(),
        field: field.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldType, SchemaField};
    use crate::source::testing::RecordingEngine;
    use serde_json::json;

    struct EchoSource {
        table: String,
    }

    impl Source for EchoSource {
        fn name(&self) -> &str { Self::NAME }
        fn path(&self) -> &str { &self.table }
        fn get_data(&self, _: &[String], _: i64, _: i64, _: Option<&[Credentials]>) -> engine::Result<Vec<Row>> {
            Ok(Vec::new())
        }
        fn validate(&self) -> ValidationResult {
            ValidationResult::success("echo")
        }
    }

    impl SourceFactory for EchoSource {
        const NAME: &'static str = "echo";

        fn schema() -> ProtocolSchema {
            ProtocolSchema::new(
                Self::NAME,
                vec![SchemaField::optional("table", FieldType::String, "table", Some(json!("t")))],
            )
        }

        fn construct(config: SourceConfig, _engine: Arc<dyn QueryEngine>) -> Result<Self> {
            Ok(Self { table: required_string_field(Self::NAME, &config, "table")? })
        }
    }

    fn config(value: Value) -> SourceConfig {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_registry() {
        let mut registry = SourceRegistry::new();
        registry.register::<EchoSource>();

        assert!(registry.contains("echo"));
        assert!(!registry.contains("other"));
        assert_eq!(registry.names(), vec!["echo"]);
    }

    #[test]
    fn test_create_applies_schema_defaults() {
        let mut registry = SourceRegistry::new();
        registry.register::<EchoSource>();

        let source = registry
            .create("echo", &SourceConfig::new(), Arc::new(RecordingEngine::default()))
            .unwrap();
        assert_eq!(source.path(), "t");
        assert_eq!(source.name(), "echo");
    }

    #[test]
    fn test_create_unknown() {
        let registry = SourceRegistry::new();
        let err = registry
            .create("nope", &SourceConfig::new(), Arc::new(RecordingEngine::default()))
            .err()
            .unwrap();
        assert!(matches!(err, Error::UnknownSource(ref n) if n == "nope"));
        assert!(matches!(registry.schema("nope"), Err(Error::UnknownSource(_))));
    }

    #[test]
    fn test_default_registry_local_file() {
        let registry = default_registry();
        assert_eq!(registry.names(), vec!["local_file"]);

        let engine = Arc::new(RecordingEngine::default());
        let source = registry
            .create("local_file", &config(json!({"location": "foo/bar.csv"})), engine)
            .unwrap();
        assert_eq!(source.path(), "dfs.`data/foo/bar.csv`");

        let err = registry
            .create("local_file", &config(json!({"unique_id": "k"})), Arc::new(RecordingEngine::default()))
            .err()
            .unwrap();
        assert!(matches!(err, Error::MissingField { ref field, .. } if field == "location"));
    }

    #[test]
    fn test_string_fields() {
        let cfg = config(json!({"a": "x", "b": null, "c": 3}));
        assert_eq!(string_field("s", &cfg, "a").unwrap(), Some("x".to_string()));
        assert_eq!(string_field("s", &cfg, "b").unwrap(), None);
        assert_eq!(string_field("s", &cfg, "missing").unwrap(), None);
        assert!(matches!(string_field("s", &cfg, "c"), Err(Error::InvalidField { .. })));
        assert!(matches!(required_string_field("s", &cfg, "b"), Err(Error::MissingField { .. })));
    }
}
