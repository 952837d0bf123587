//! Backend table references
//!
//! Format: ``<connection>.`<table path>` ``
//!
//! Examples:
//! - ``dfs.`data/customers.csv` ``
//! - ``dfs.`data/2024/orders.jsonl` ``

use super::{EngineError, Result};
use std::fmt;
use std::str::FromStr;

/// A connection-qualified, backtick-quoted table reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    /// Storage connection (Drill workspace plugin), e.g. `dfs`
    pub connection: String,
    /// Table path inside the connection, unquoted
    pub table: String,
}

impl TableRef {
    pub fn new(connection: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            connection: connection.into(),
            table: table.into(),
        }
    }

    /// Reference to a file under the connection's `data` folder
    pub fn data_file(connection: impl Into<String>, location: &str) -> Self {
        Self::new(connection, format!("data/{}", location))
    }

    /// Parse a reference string
    ///
    /// Expected format: ``<connection>.`<table>` ``
    pub fn parse(reference: &str) -> Result<Self> {
        let malformed = |reason: &str| EngineError::MalformedPath(format!("{}: {}", reason, reference));

        let (connection, quoted) = reference
            .split_once('.')
            .ok_or_else(|| malformed("missing connection separator"))?;

        if connection.is_empty() || connection.contains('`') {
            return Err(malformed("invalid connection name"));
        }

        let table = quoted
            .strip_prefix('`')
            .and_then(|rest| rest.strip_suffix('`'))
            .ok_or_else(|| malformed("table must be backtick-quoted"))?;

        if table.is_empty() || table.contains('`') {
            return Err(malformed("invalid table path"));
        }

        Ok(Self::new(connection, table))
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.`{}`", self.connection, self.table)
    }
}

impl FromStr for TableRef {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
