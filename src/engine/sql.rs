//! SQL rendering for engine reads
//!
//! Drill and SQLite both accept backtick-quoted identifiers, so a single
//! rendering serves both engines; only the table expression differs.

use super::Row;

/// Default name of the column produced by the dedup window
pub const DEDUP_COLUMN: &str = "__dedup_rank";

/// A projected, paginated, deduplicated read
///
/// Rows sharing a `unique_id` value collapse to one; rows whose
/// `unique_id` is NULL are all kept, since NULL identifies nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadQuery<'a> {
    pub fields: &'a [String],
    pub offset: i64,
    pub limit: i64,
    pub unique_id: &'a str,
    pub helper: String,
}

impl<'a> ReadQuery<'a> {
    pub fn new(fields: &'a [String], offset: i64, limit: i64, unique_id: &'a str) -> Self {
        Self {
            fields,
            offset,
            limit,
            unique_id,
            helper: DEDUP_COLUMN.to_string(),
        }
    }

    /// Use a helper column name that cannot collide with `columns`
    pub fn avoiding(mut self, columns: &[String]) -> Self {
        self.helper = helper_column(columns);
        self
    }

    /// Render against a table expression (already quoted for the target dialect)
    pub fn to_sql(&self, table: &str) -> String {
        let projection = if self.fields.is_empty() {
            "*".to_string()
        } else {
            self.fields
                .iter()
                .map(|f| quote_ident(f))
                .collect::<Vec<_>>()
                .join(", ")
        };
        let uid = quote_ident(self.unique_id);
        let helper = quote_ident(&self.helper);

        format!(
            "SELECT {projection} FROM (SELECT *, ROW_NUMBER() OVER (PARTITION BY {uid} ORDER BY {uid}) AS {helper} FROM {table}) AS deduped WHERE {helper} = 1 OR {uid} IS NULL ORDER BY {uid} LIMIT {limit} OFFSET {offset}",
            limit = self.limit,
            offset = self.offset,
        )
    }

    /// Drop the helper column from a result row.
    ///
    /// Only a `*` projection carries it; explicit projections are left alone.
    pub fn strip_helper(&self, mut row: Row) -> Row {
        if self.fields.is_empty() {
            row.shift_remove(&self.helper);
        }
        row
    }
}

/// First of `__dedup_rank`, `__dedup_rank_`, ... not present in `columns`
pub fn helper_column(columns: &[String]) -> String {
    let mut helper = DEDUP_COLUMN.to_string();
    while columns.iter().any(|c| c.eq_ignore_ascii_case(&helper)) {
        helper.push('_');
    }
    helper
}

/// Cheapest query that proves a table is readable
pub fn probe_sql(table: &str) -> String {
    format!("SELECT * FROM {} LIMIT 1", table)
}

/// Quote an identifier with backticks, doubling embedded backticks
pub fn quote_ident(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_projection() {
        let fields = vec!["name".to_string(), "age".to_string()];
        let sql = ReadQuery::new(&fields, 20, 10, "id").to_sql("dfs.`data/people.csv`");
        assert_eq!(
            sql,
            "SELECT `name`, `age` FROM (SELECT *, ROW_NUMBER() OVER (PARTITION BY `id` ORDER BY `id`) AS `__dedup_rank` FROM dfs.`data/people.csv`) AS deduped WHERE `__dedup_rank` = 1 OR `id` IS NULL ORDER BY `id` LIMIT 10 OFFSET 20"
        );
    }

    #[test]
    fn test_render_star_when_no_fields() {
        let sql = ReadQuery::new(&[], 0, 5, "key").to_sql("t");
        assert!(sql.starts_with("SELECT * FROM (SELECT *"));
        assert!(sql.contains("PARTITION BY `key`"));
    }

    #[test]
    fn test_helper_avoids_existing_columns() {
        let columns = vec!["id".to_string(), "__DEDUP_RANK".to_string(), "__dedup_rank_".to_string()];
        assert_eq!(helper_column(&columns), "__dedup_rank__");
        assert_eq!(helper_column(&["id".to_string()]), DEDUP_COLUMN);

        let query = ReadQuery::new(&[], 0, 1, "id").avoiding(&columns);
        assert!(query.to_sql("t").contains("AS `__dedup_rank__`"));
    }

    #[test]
    fn test_quote_ident_escapes_backticks() {
        assert_eq!(quote_ident("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_strip_helper() {
        let row = json!({"id": 1, "__dedup_rank": 1, "name": "a"}).as_object().cloned().unwrap();

        let star = ReadQuery::new(&[], 0, 1, "id");
        assert_eq!(star.strip_helper(row.clone()).keys().collect::<Vec<_>>(), vec!["id", "name"]);

        // A projected column that happens to share the helper name survives
        let fields = vec!["__dedup_rank".to_string()];
        let projected = ReadQuery::new(&fields, 0, 1, "id");
        assert_eq!(projected.strip_helper(row).len(), 3);
    }
}
