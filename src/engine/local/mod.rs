//! Embedded query engine
//!
//! Serves a Drill-style `dfs` workspace from a local directory. Files are
//! loaded on first use into an in-memory SQLite database and queried with the
//! same SQL the Drill engine sends. Loaded tables are cached per file and
//! reloaded when the file's modification time changes.

pub mod loader;

use super::sql::{self, ReadQuery};
use super::{EngineError, QueryEngine, Result, Row, TableRef, ValidationResult};
use loader::FileFormat;
use rusqlite::{Connection, params_from_iter};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::SystemTime;

/// Default Drill workspace name for file-system storage
pub const DEFAULT_CONNECTION: &str = "dfs";

#[derive(Clone)]
struct CachedTable {
    name: String,
    modified: Option<SystemTime>,
    columns: Vec<String>,
    rows: usize,
}

struct Catalog {
    conn: Connection,
    tables: HashMap<PathBuf, CachedTable>,
    next_id: usize,
}

/// Query engine over files below a root directory
pub struct LocalEngine {
    root: PathBuf,
    connection: String,
    catalog: Mutex<Catalog>,
}

impl LocalEngine {
    /// Create an engine serving `root` under the given connection name
    pub fn new(root: impl Into<PathBuf>, connection: impl Into<String>) -> Result<Self> {
        let catalog = Catalog {
            conn: Connection::open_in_memory()?,
            tables: HashMap::new(),
            next_id: 0,
        };
        Ok(Self {
            root: root.into(),
            connection: connection.into(),
            catalog: Mutex::new(catalog),
        })
    }

    /// Resolve a table reference to a file inside the root
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let table = TableRef::parse(path)?;
        if table.connection != self.connection {
            return Err(EngineError::UnknownConnection {
                expected: self.connection.clone(),
                found: table.connection,
            });
        }

        let relative = Path::new(&table.table);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(EngineError::MalformedPath(format!(
                "{} must stay inside the workspace root",
                path
            )));
        }

        let file = self.root.join(relative);
        if !file.is_file() {
            return Err(EngineError::NotFound(path.to_string()));
        }
        Ok(file)
    }

    fn lock(&self) -> MutexGuard<'_, Catalog> {
        // Poisoned only if a load panicked; its transaction was rolled back
        self.catalog.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make sure `file` is loaded and current
    fn ensure_loaded(catalog: &mut Catalog, file: &Path) -> Result<CachedTable> {
        let modified = std::fs::metadata(file)?.modified().ok();

        if let Some(cached) = catalog.tables.get(file) {
            if cached.modified.is_some() && cached.modified == modified {
                return Ok(cached.clone());
            }
        }

        let format = FileFormat::from_path(file)
            .ok_or_else(|| EngineError::UnsupportedFormat(file.display().to_string()))?;
        let dataset = loader::load(file, format)?;

        let name = match catalog.tables.get(file) {
            Some(cached) => cached.name.clone(),
            None => {
                catalog.next_id += 1;
                format!("t{}", catalog.next_id)
            }
        };
        let quoted = sql::quote_ident(&name);
        let columns = dataset
            .columns
            .iter()
            .map(|c| sql::quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; dataset.columns.len()].join(", ");

        let tx = catalog.conn.transaction()?;
        tx.execute(&format!("DROP TABLE IF EXISTS {}", quoted), [])?;
        tx.execute(&format!("CREATE TABLE {} ({})", quoted, columns), [])?;
        {
            let mut stmt = tx.prepare(&format!("INSERT INTO {} VALUES ({})", quoted, placeholders))?;
            for row in &dataset.rows {
                stmt.execute(params_from_iter(row.iter()))?;
            }
        }
        tx.commit()?;

        tracing::debug!(
            "Loaded {} ({} rows, {} columns) into {}",
            file.display(),
            dataset.rows.len(),
            dataset.columns.len(),
            name
        );

        let table = CachedTable {
            name,
            modified,
            rows: dataset.rows.len(),
            columns: dataset.columns,
        };
        catalog.tables.insert(file.to_path_buf(), table.clone());
        Ok(table)
    }
}

impl QueryEngine for LocalEngine {
    fn name(&self) -> &str {
        "local"
    }

    fn read(
        &self,
        path: &str,
        fields: &[String],
        offset: i64,
        limit: i64,
        unique_id: &str,
    ) -> Result<Vec<Row>> {
        let file = self.resolve(path)?;
        let mut catalog = self.lock();
        let table = Self::ensure_loaded(&mut catalog, &file)?;

        let query = ReadQuery::new(fields, offset, limit, unique_id).avoiding(&table.columns);
        let statement = query.to_sql(&sql::quote_ident(&table.name));
        tracing::debug!("Local query for {}: {}", path, statement);

        let mut stmt = catalog.conn.prepare(&statement)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let rows = stmt
            .query_map([], |row| {
                let mut out = Row::new();
                for (i, column) in columns.iter().enumerate() {
                    let value: rusqlite::types::Value = row.get(i)?;
                    out.insert(column.clone(), loader::sql_to_json(value));
                }
                Ok(out)
            })?
            .map(|r| r.map(|row| query.strip_helper(row)))
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    fn validate(&self, path: &str) -> ValidationResult {
        let loaded = self.resolve(path).and_then(|file| {
            let mut catalog = self.lock();
            Self::ensure_loaded(&mut catalog, &file)
        });

        match loaded {
            Ok(table) => ValidationResult::success(format!("{} is readable ({} rows)", path, table.rows)),
            Err(e) => {
                tracing::warn!("Validation failed for {}: {}", path, e);
                ValidationResult::failure(e.to_string())
            }
        }
    }
}
