//! File loading for the local engine
//!
//! Turns a data file into a column list plus typed rows ready for insertion
//! into SQLite.

use crate::engine::{EngineError, Result};
use rusqlite::types::Value as SqlValue;
use serde_json::Value as JsonValue;
use std::path::Path;

/// Supported on-disk formats, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Tsv,
    Json,
    JsonLines,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(FileFormat::Csv),
            "tsv" => Some(FileFormat::Tsv),
            "json" => Some(FileFormat::Json),
            "jsonl" | "ndjson" => Some(FileFormat::JsonLines),
            _ => None,
        }
    }
}

/// A fully materialized table
#[derive(Debug, Default)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

/// Load a file in the given format
pub fn load(path: &Path, format: FileFormat) -> Result<Dataset> {
    let dataset = match format {
        FileFormat::Csv => load_delimited(path, b',')?,
        FileFormat::Tsv => load_delimited(path, b'\t')?,
        FileFormat::Json => {
            let content = std::fs::read_to_string(path)?;
            let parsed: JsonValue = serde_json::from_str(&content).map_err(|e| load_error(path, e))?;
            let JsonValue::Array(items) = parsed else {
                return Err(load_error(path, "expected a top-level array of objects"));
            };
            from_json_objects(path, items)?
        }
        FileFormat::JsonLines => {
            let content = std::fs::read_to_string(path)?;
            let items = content
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(serde_json::from_str::<JsonValue>)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| load_error(path, e))?;
            from_json_objects(path, items)?
        }
    };

    if dataset.columns.is_empty() {
        return Err(load_error(path, "no columns found"));
    }
    Ok(dataset)
}

fn load_delimited(path: &Path, delimiter: u8) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_path(path)
        .map_err(|e| load_error(path, e))?;

    let columns = reader
        .headers()
        .map_err(|e| load_error(path, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| load_error(path, e))?;
        rows.push(record.iter().map(infer_cell).collect());
    }

    Ok(Dataset { columns, rows })
}

fn from_json_objects(path: &Path, items: Vec<JsonValue>) -> Result<Dataset> {
    let mut dataset = Dataset::default();
    let mut objects = Vec::with_capacity(items.len());

    for item in items {
        let JsonValue::Object(object) = item else {
            return Err(load_error(path, "every record must be a JSON object"));
        };
        for key in object.keys() {
            if !dataset.columns.iter().any(|c| c == key) {
                dataset.columns.push(key.clone());
            }
        }
        objects.push(object);
    }

    for mut object in objects {
        let row = dataset
            .columns
            .iter()
            .map(|c| object.remove(c).map(json_to_sql).unwrap_or(SqlValue::Null))
            .collect();
        dataset.rows.push(row);
    }

    Ok(dataset)
}

/// Type a text cell: integer, then finite float, otherwise text. Empty is null.
fn infer_cell(cell: &str) -> SqlValue {
    if cell.is_empty() {
        return SqlValue::Null;
    }
    if let Ok(i) = cell.parse::<i64>() {
        return SqlValue::Integer(i);
    }
    match cell.parse::<f64>() {
        Ok(f) if f.is_finite() => SqlValue::Real(f),
        _ => SqlValue::Text(cell.to_string()),
    }
}

fn json_to_sql(value: JsonValue) -> SqlValue {
    match value {
        JsonValue::Null => SqlValue::Null,
        JsonValue::Bool(b) => SqlValue::Integer(b as i64),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map(SqlValue::Real).unwrap_or(SqlValue::Null),
        },
        JsonValue::String(s) => SqlValue::Text(s),
        nested => SqlValue::Text(nested.to_string()),
    }
}

/// Convert a SQLite value back to JSON for result rows
pub fn sql_to_json(value: SqlValue) -> JsonValue {
    match value {
        SqlValue::Null => JsonValue::Null,
        SqlValue::Integer(i) => JsonValue::from(i),
        SqlValue::Real(f) => serde_json::Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        SqlValue::Text(s) => JsonValue::String(s),
        SqlValue::Blob(b) => JsonValue::String(String::from_utf8_lossy(&b).into_owned()),
    }
}

fn load_error(path: &Path, reason: impl ToString) -> EngineError {
    EngineError::Load {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}
