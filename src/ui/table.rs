use crate::engine::Row;
use serde_json::Value;
use tabled::{builder::Builder, settings::Style};

/// Table with a fixed header and string cells
pub struct TableBuilder {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TableBuilder {
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        let mut builder = Builder::default();
        builder.push_record(self.header.clone());
        for row in &self.rows {
            builder.push_record(row.clone());
        }
        builder.build().with(Style::rounded()).to_string()
    }
}

/// Render result rows; columns are taken from the first row
pub fn rows_table(rows: &[Row]) -> String {
    let Some(first) = rows.first() else {
        return String::new();
    };

    let columns: Vec<String> = first.keys().cloned().collect();
    let mut table = TableBuilder::new(columns.clone());
    for row in rows {
        table.add_row(columns.iter().map(|c| cell(row.get(c))));
    }
    table.build()
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_table_renders_nothing() {
        assert_eq!(TableBuilder::new(["a"]).build(), "");
        assert_eq!(rows_table(&[]), "");
    }

    #[test]
    fn test_rows_table() {
        let rows: Vec<Row> = vec![
            json!({"id": 1, "name": "ann"}).as_object().cloned().unwrap(),
            json!({"id": 2, "name": null}).as_object().cloned().unwrap(),
        ];
        let rendered = rows_table(&rows);
        assert!(rendered.contains("name"));
        assert!(rendered.contains("ann"));
        assert!(!rendered.contains("null"));
    }
}
