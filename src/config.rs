use crate::engine::{self, DrillEngine, LocalEngine, QueryEngine};
use crate::source::SourceConfig;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Which query engine backs the configured sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EngineConfig {
    Local {
        #[serde(default = "default_root")]
        root: PathBuf,
        #[serde(default = "default_connection")]
        connection: String,
    },
    Drill {
        url: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_connection() -> String {
    engine::local::DEFAULT_CONNECTION.to_string()
}

fn default_timeout_secs() -> u64 {
    engine::drill::DEFAULT_TIMEOUT_SECS
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig::Local {
            root: default_root(),
            connection: default_connection(),
        }
    }
}

impl EngineConfig {
    pub fn build(&self) -> engine::Result<Arc<dyn QueryEngine>> {
        let engine: Arc<dyn QueryEngine> = match self {
            EngineConfig::Local { root, connection } => Arc::new(LocalEngine::new(root, connection.as_str())?),
            EngineConfig::Drill { url, timeout_secs } => {
                Arc::new(DrillEngine::new(url.as_str(), Duration::from_secs(*timeout_secs))?)
            }
        };
        Ok(engine)
    }
}

/// A named source: adapter kind plus its raw configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub name: String,
    pub kind: String,
    #[serde(flatten)]
    pub config: SourceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DrillsourceConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

impl DrillsourceConfig {
    pub fn source(&self, name: &str) -> Option<&SourceEntry> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Config written by `init`
    pub fn starter() -> Self {
        let mut config = SourceConfig::new();
        config.insert("location".to_string(), json!("example.csv"));
        config.insert("unique_id".to_string(), json!("id"));

        Self {
            engine: EngineConfig::default(),
            sources: vec![SourceEntry {
                name: "example".to_string(),
                kind: "local_file".to_string(),
                config,
            }],
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("drillsource.toml")
}

/// Load the config file, `None` if it does not exist.
///
/// A relative local engine root is taken relative to the config file.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<DrillsourceConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let mut config: DrillsourceConfig = toml::from_str(&contents)?;

    if let EngineConfig::Local { root, .. } = &mut config.engine {
        if root.is_relative() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                *root = parent.join(&*root);
            }
        }
    }

    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &DrillsourceConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local() {
        let config: DrillsourceConfig = toml::from_str(
            r#"
            [engine]
            kind = "local"
            root = "/srv"

            [[sources]]
            name = "customers"
            kind = "local_file"
            location = "customers.csv"
            unique_id = "customer_id"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.engine,
            EngineConfig::Local {
                root: PathBuf::from("/srv"),
                connection: "dfs".to_string()
            }
        );
        let entry = config.source("customers").unwrap();
        assert_eq!(entry.kind, "local_file");
        assert_eq!(entry.config["location"], json!("customers.csv"));
        assert!(!entry.config.contains_key("name"));
        assert!(config.source("other").is_none());
    }

    #[test]
    fn test_parse_drill_defaults() {
        let config: DrillsourceConfig = toml::from_str(
            r#"
            [engine]
            kind = "drill"
            url = "http://localhost:8047"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.engine,
            EngineConfig::Drill {
                url: "http://localhost:8047".to_string(),
                timeout_secs: 30
            }
        );
        assert!(config.sources.is_empty());
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("nope.toml"))).unwrap().is_none());
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drillsource.toml");

        write_config(&path, &DrillsourceConfig::starter(), false).unwrap();
        assert!(write_config(&path, &DrillsourceConfig::starter(), false).is_err());
        write_config(&path, &DrillsourceConfig::starter(), true).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.sources, DrillsourceConfig::starter().sources);
        // Relative root now points next to the config file
        assert_eq!(
            loaded.engine,
            EngineConfig::Local {
                root: dir.path().join("."),
                connection: "dfs".to_string()
            }
        );
    }
}
