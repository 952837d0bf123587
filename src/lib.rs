//! # Drillsource - pluggable source adapters
//!
//! Uniform read/validate access to datasets through a shared query engine.
//!
//! Drillsource provides:
//! - A `Source` trait and a name-keyed registry of adapters
//! - Static protocol schemas used to validate adapter configuration
//! - A `QueryEngine` trait with an embedded (SQLite-backed) and a Drill REST implementation
//! - The `local_file` adapter for file-backed datasets

pub mod schema;
pub mod engine;
pub mod source;
pub mod config;
pub mod output;
pub mod ui;

// Re-exports for convenient access
pub use engine::{EngineError, QueryEngine, Row, ValidationResult};
pub use schema::{FieldType, ProtocolSchema, SchemaField};
pub use source::{LocalFileSource, Source, SourceConfig, SourceRegistry};

/// Result type alias for Drillsource operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Drillsource operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Missing required field '{field}' for source '{source_name}'")]
    MissingField { source_name: String, field: String },

    #[error("Invalid value for field '{field}' of source '{source_name}': {reason}")]
    InvalidField {
        source_name: String,
        field: String,
        reason: String,
    },

    #[error("Unknown source: {0}")]
    UnknownSource(String),
}
