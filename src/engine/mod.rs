//! Query Engine
//!
//! The engine is the shared backend every source adapter delegates to. It
//! executes projected, paginated, deduplicated reads against a table
//! reference and checks whether a reference is reachable.
//!
//! Two engines are provided:
//! - [`LocalEngine`]: embedded, loads files under a root directory into SQLite
//! - [`DrillEngine`]: talks to an Apache Drill server over its REST API

pub mod drill;
pub mod local;
pub mod sql;
pub mod table_ref;

pub use drill::DrillEngine;
pub use local::LocalEngine;
pub use sql::ReadQuery;
pub use table_ref::TableRef;

use serde::Serialize;

/// A single result row: column name to value, in column order
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Opaque credential mapping handed to adapters that need one
pub type Credentials = serde_json::Map<String, serde_json::Value>;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised by a query engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Malformed table reference: {0}")]
    MalformedPath(String),

    #[error("Unknown connection '{found}' (expected '{expected}')")]
    UnknownConnection { expected: String, found: String },

    #[error("Table not found: {0}")]
    NotFound(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to load {path}: {reason}")]
    Load { path: String, reason: String },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Drill error: {0}")]
    Drill(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of a pre-flight reachability check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub ok: bool,
    pub message: String,
}

impl ValidationResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Capabilities shared by all source adapters
///
/// Implementations must be safe to call concurrently; adapters hold an
/// `Arc<dyn QueryEngine>` and never synchronize on their own.
pub trait QueryEngine: Send + Sync {
    /// Engine name (for display)
    fn name(&self) -> &str;

    /// Read up to `limit` rows starting at `offset`, projected to `fields`
    /// (all columns when empty), one row per distinct non-null `unique_id`
    /// value plus every row whose `unique_id` is null, ordered by `unique_id`.
    fn read(
        &self,
        path: &str,
        fields: &[String],
        offset: i64,
        limit: i64,
        unique_id: &str,
    ) -> Result<Vec<Row>>;

    /// Check that `path` is well-formed and reachable
    fn validate(&self, path: &str) -> ValidationResult;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validation_result_json() {
        let failed = ValidationResult::failure("no such file");
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({"ok": false, "message": "no such file"})
        );
        assert!(ValidationResult::success("fine").ok);
    }
}
