//! Apache Drill REST engine
//!
//! Submits SQL to `POST <url>/query.json` and maps the JSON reply to rows.

use super::sql::{self, ReadQuery};
use super::{EngineError, QueryEngine, Result, Row, TableRef, ValidationResult};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    query_type: &'a str,
    query: &'a str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QueryResponse {
    Error {
        #[serde(rename = "errorMessage")]
        error_message: String,
    },
    Success {
        #[serde(default)]
        rows: Vec<Row>,
        #[serde(rename = "queryState", default)]
        query_state: Option<String>,
    },
}

/// Query engine backed by a Drill server
#[derive(Debug, Clone)]
pub struct DrillEngine {
    client: Client,
    base_url: String,
}

impl DrillEngine {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn run(&self, query: &str) -> Result<Vec<Row>> {
        tracing::debug!("Drill query: {}", query);
        let resp = self
            .client
            .post(format!("{}/query.json", self.base_url))
            .json(&QueryRequest {
                query_type: "SQL",
                query,
            })
            .send()?;

        let status = resp.status().as_u16();
        let body = resp.text()?;
        parse_response(status, &body)
    }
}

/// Map a Drill REST reply to rows or an error
pub fn parse_response(status: u16, body: &str) -> Result<Vec<Row>> {
    let parsed: QueryResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) if (200..300).contains(&status) => {
            return Err(EngineError::Drill(format!("unreadable response: {}", e)));
        }
        Err(_) => return Err(EngineError::Drill(format!("HTTP {}: {}", status, body.trim()))),
    };

    match parsed {
        QueryResponse::Error { error_message } => Err(EngineError::Drill(error_message)),
        QueryResponse::Success { .. } if !(200..300).contains(&status) => {
            Err(EngineError::Drill(format!("HTTP {}", status)))
        }
        QueryResponse::Success {
            query_state: Some(state),
            ..
        } if state != "COMPLETED" => Err(EngineError::Drill(format!("query ended in state {}", state))),
        QueryResponse::Success { rows, .. } => Ok(rows),
    }
}

impl QueryEngine for DrillEngine {
    fn name(&self) -> &str {
        "drill"
    }

    fn read(
        &self,
        path: &str,
        fields: &[String],
        offset: i64,
        limit: i64,
        unique_id: &str,
    ) -> Result<Vec<Row>> {
        TableRef::parse(path)?;
        let query = ReadQuery::new(fields, offset, limit, unique_id);
        let rows = self.run(&query.to_sql(path))?;
        Ok(rows.into_iter().map(|row| query.strip_helper(row)).collect())
    }

    fn validate(&self, path: &str) -> ValidationResult {
        let checked = TableRef::parse(path).and_then(|_| self.run(&sql::probe_sql(path)));
        match checked {
            Ok(_) => ValidationResult::success(format!("{} is reachable", path)),
            Err(e) => {
                tracing::warn!("Validation failed for {}: {}", path, e);
                ValidationResult::failure(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_success() {
        let body = r#"{
            "queryId": "1a2b",
            "columns": ["id", "name", "__dedup_rank"],
            "rows": [{"id": "1", "name": "ann", "__dedup_rank": "1"}],
            "queryState": "COMPLETED"
        }"#;
        let rows = parse_response(200, body).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], json!("ann"));
        assert_eq!(rows[0]["__dedup_rank"], json!("1"));
    }

    #[test]
    fn test_parse_error_message() {
        let body = r#"{"errorMessage": "VALIDATION ERROR: Table 'data/x.csv' not found"}"#;
        match parse_response(500, body) {
            Err(EngineError::Drill(msg)) => assert!(msg.contains("not found")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_failed_state() {
        let body = r#"{"rows": [], "queryState": "FAILED"}"#;
        assert!(matches!(parse_response(200, body), Err(EngineError::Drill(_))));
    }

    #[test]
    fn test_parse_non_json_error_page() {
        match parse_response(502, "<html>Bad Gateway</html>") {
            Err(EngineError::Drill(msg)) => assert!(msg.starts_with("HTTP 502")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_malformed_without_request() {
        // Port 9 (discard) is never contacted: the reference fails to parse first
        let engine = DrillEngine::new("http://127.0.0.1:9/", Duration::from_millis(50)).unwrap();
        assert_eq!(engine.base_url(), "http://127.0.0.1:9");

        let result = engine.validate("dfs.data/x.csv");
        assert!(!result.ok);
        assert!(result.message.contains("Malformed"));
    }

    #[test]
    fn test_read_rejects_malformed_without_request() {
        let engine = DrillEngine::new("http://127.0.0.1:9/", Duration::from_millis(50)).unwrap();

        let err = engine.read("dfs.data/x.csv", &[], 0, 10, "id").unwrap_err();
        assert!(matches!(err, EngineError::MalformedPath(_)), "{:?}", err);
    }
}
