//! Source Adapter Framework
//!
//! Each adapter declares a static configuration schema and turns a validated
//! configuration into a backend table reference. Reading and validation are
//! delegated to the shared query engine injected at construction.

pub mod framework;
pub mod local_file;

pub use framework::{Source, SourceConfig, SourceFactory, SourceRegistry, default_registry};
pub use local_file::{LocalFileConfig, LocalFileSource};

#[cfg(test)]
pub(crate) mod testing {
    use crate::engine::{self, EngineError, QueryEngine, Row, ValidationResult};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ReadCall {
        pub path: String,
        pub fields: Vec<String>,
        pub offset: i64,
        pub limit: i64,
        pub unique_id: String,
    }

    /// Engine double that records its calls and replays canned answers
    pub struct RecordingEngine {
        rows: Vec<Row>,
        failure: Option<String>,
        verdict: ValidationResult,
        reads: Mutex<Vec<ReadCall>>,
        validated: Mutex<Vec<String>>,
    }

    impl Default for RecordingEngine {
        fn default() -> Self {
            Self {
                rows: Vec::new(),
                failure: None,
                verdict: ValidationResult::success("ok"),
                reads: Mutex::new(Vec::new()),
                validated: Mutex::new(Vec::new()),
            }
        }
    }

    impl RecordingEngine {
        pub fn with_rows(rows: Vec<Row>) -> Self {
            Self { rows, ..Self::default() }
        }

        pub fn failing(message: &str) -> Self {
            Self { failure: Some(message.to_string()), ..Self::default() }
        }

        pub fn with_verdict(verdict: ValidationResult) -> Self {
            Self { verdict, ..Self::default() }
        }

        pub fn rows(&self) -> Vec<Row> {
            self.rows.clone()
        }

        pub fn reads(&self) -> Vec<ReadCall> {
            self.reads.lock().unwrap().clone()
        }

        pub fn validated(&self) -> Vec<String> {
            self.validated.lock().unwrap().clone()
        }
    }

    impl QueryEngine for RecordingEngine {
        fn name(&self) -> &str {
            "recording"
        }

        fn read(&self, path: &str, fields: &[String], offset: i64, limit: i64, unique_id: &str) -> engine::Result<Vec<Row>> {
            self.reads.lock().unwrap().push(ReadCall {
                path: path.to_string(),
                fields: fields.to_vec(),
                offset,
                limit,
                unique_id: unique_id.to_string(),
            });
            match &self.failure {
                Some(message) => Err(EngineError::Drill(message.clone())),
                None => Ok(self.rows.clone()),
            }
        }

        fn validate(&self, path: &str) -> ValidationResult {
            self.validated.lock().unwrap().push(path.to_string());
            self.verdict.clone()
        }
    }
}
