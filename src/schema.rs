//! Protocol schemas
//!
//! Every source adapter declares the configuration it accepts as a static
//! [`ProtocolSchema`]. The registry checks raw configuration against it
//! before an adapter is constructed, and the CLI renders it for users.

use crate::{Error, Result};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::fmt;

/// Value type of a configuration field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
        }
    }

    /// Check whether a JSON value has this type
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single configuration field declaration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaField {
    pub name: String,
    pub field_type: FieldType,
    pub optional: bool,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl SchemaField {
    /// A required field
    pub fn required(name: impl Into<String>, field_type: FieldType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type,
            optional: false,
            description: description.into(),
            default: None,
        }
    }

    /// An optional field, filled with `default` when absent
    pub fn optional(
        name: impl Into<String>,
        field_type: FieldType,
        description: impl Into<String>,
        default: Option<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            field_type,
            optional: true,
            description: description.into(),
            default,
        }
    }
}

/// Static description of a source adapter's configuration contract
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtocolSchema {
    pub name: String,
    pub fields: Vec<SchemaField>,
}

impl ProtocolSchema {
    pub fn new(name: impl Into<String>, fields: Vec<SchemaField>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Check a raw configuration against this schema.
    ///
    /// Returns the configuration with defaults filled in for absent optional
    /// fields. A `null` value counts as absent. Keys the schema does not
    /// declare are passed through untouched.
    pub fn apply(&self, config: &Map<String, Value>) -> Result<Map<String, Value>> {
        let mut resolved = config.clone();

        for field in &self.fields {
            match config.get(&field.name) {
                Some(Value::Null) | None => {
                    if !field.optional {
                        return Err(Error::MissingField {
                            source_name: self.name.clone(),
                            field: field.name.clone(),
                        });
                    }
                    match &field.default {
                        Some(default) => {
                            resolved.insert(field.name.clone(), default.clone());
                        }
                        None => {
                            resolved.remove(&field.name);
                        }
                    }
                }
                Some(value) if !field.field_type.accepts(value) => {
                    return Err(Error::InvalidField {
                        source_name: self.name.clone(),
                        field: field.name.clone(),
                        reason: format!("expected {}, got {}", field.field_type, value),
                    });
                }
                Some(_) => {}
            }
        }

        Ok(resolved)
    }

    /// Render as a JSON Schema object, for form generation in UIs
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for field in &self.fields {
            let mut prop = json!({
                "type": field.field_type.as_str(),
                "description": field.description,
            });
            if let Some(default) = &field.default {
                prop["default"] = default.clone();
            }
            properties.insert(field.name.clone(), prop);
            if !field.optional {
                required.push(Value::String(field.name.clone()));
            }
        }

        json!({
            "title": self.name,
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ProtocolSchema {
        ProtocolSchema::new(
            "demo",
            vec![
                SchemaField::required("location", FieldType::String, "where"),
                SchemaField::optional("unique_id", FieldType::String, "id column", Some(json!("id"))),
                SchemaField::optional("batch", FieldType::Integer, "batch size", None),
            ],
        )
    }

    fn config(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_apply_fills_defaults() {
        let resolved = schema().apply(&config(json!({"location": "a.csv"}))).unwrap();
        assert_eq!(resolved["unique_id"], json!("id"));
        assert!(!resolved.contains_key("batch"));
    }

    #[test]
    fn test_apply_treats_null_as_absent() {
        let resolved = schema()
            .apply(&config(json!({"location": "a.csv", "unique_id": null})))
            .unwrap();
        assert_eq!(resolved["unique_id"], json!("id"));
    }

    #[test]
    fn test_apply_missing_required() {
        let err = schema().apply(&config(json!({"unique_id": "k"}))).unwrap_err();
        match err {
            Error::MissingField { source_name, field } => {
                assert_eq!(source_name, "demo");
                assert_eq!(field, "location");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_apply_wrong_type() {
        let err = schema()
            .apply(&config(json!({"location": 42})))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidField { ref field, .. } if field == "location"));
    }

    #[test]
    fn test_apply_keeps_unknown_keys() {
        let resolved = schema()
            .apply(&config(json!({"location": "a.csv", "extra": true})))
            .unwrap();
        assert_eq!(resolved["extra"], json!(true));
    }

    #[test]
    fn test_json_schema() {
        let rendered = schema().to_json_schema();
        assert_eq!(rendered["title"], json!("demo"));
        assert_eq!(rendered["required"], json!(["location"]));
        assert_eq!(rendered["properties"]["unique_id"]["default"], json!("id"));
        assert_eq!(rendered["properties"]["batch"]["type"], json!("integer"));
    }
}
