//! Drillsource CLI - inspect, validate and read configured data sources

use clap::{Parser, Subcommand};
use drillsource::config::{self, DrillsourceConfig, SourceEntry};
use drillsource::engine::{QueryEngine, ValidationResult};
use drillsource::output::{OutputMode, emit_json};
use drillsource::source::{Source, SourceRegistry, default_registry};
use drillsource::ui::{self, Icons, Spinner, TableBuilder};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "drillsource")]
#[command(version)]
#[command(about = "Pluggable source adapters over a Drill-style query engine")]
#[command(long_about = r#"
Drillsource reads datasets through source adapters that share one query engine.

Example usage:
  drillsource init
  drillsource schema local_file
  drillsource validate
  drillsource read --source example --fields id,name --limit 20
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to drillsource.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered source adapters
    Adapters,

    /// Show the configuration schema of an adapter
    Schema {
        /// Adapter name, e.g. local_file
        adapter: String,
    },

    /// List configured sources and their table references
    Sources,

    /// Check that configured sources are reachable
    Validate {
        /// Only validate this source (default: all)
        #[arg(short, long)]
        source: Option<String>,
    },

    /// Read rows from a configured source
    Read {
        /// Source name from the config file
        #[arg(short, long)]
        source: String,

        /// Comma-separated columns to project (default: all)
        #[arg(short, long, value_delimiter = ',')]
        fields: Vec<String>,

        /// Rows to skip
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        offset: i64,

        /// Maximum rows to return
        #[arg(short, long, default_value = "100", allow_negative_numbers = true)]
        limit: i64,
    },

    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mode = OutputMode::from_flag(cli.json);
    let registry = default_registry();

    match cli.command {
        Commands::Adapters => run_adapters(&registry, mode),
        Commands::Schema { adapter } => run_schema(&registry, &adapter, mode),
        Commands::Sources => {
            let config = load(cli.config.as_ref())?;
            run_sources(&registry, &config, mode)
        }
        Commands::Validate { source } => {
            let config = load(cli.config.as_ref())?;
            run_validate(&registry, &config, source.as_deref(), mode)
        }
        Commands::Read { source, fields, offset, limit } => {
            let config = load(cli.config.as_ref())?;
            run_read(&registry, &config, &source, &fields, offset, limit, mode)
        }
        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            config::write_config(&path, &DrillsourceConfig::starter(), force)?;
            if mode.is_human() {
                ui::success(&format!("Wrote {}", path.display()));
            } else {
                emit_json("init", &serde_json::json!({ "path": path }))?;
            }
            Ok(())
        }
    }
}

fn load(path: Option<&PathBuf>) -> anyhow::Result<DrillsourceConfig> {
    match config::load_config(path.map(PathBuf::as_path))? {
        Some(config) => Ok(config),
        None => {
            ui::warn("No config file found; run `drillsource init` to create one");
            Ok(DrillsourceConfig::default())
        }
    }
}

fn find_entry<'a>(config: &'a DrillsourceConfig, name: &str) -> anyhow::Result<&'a SourceEntry> {
    config
        .source(name)
        .ok_or_else(|| anyhow::anyhow!("no source named '{}' in config", name))
}

fn open(registry: &SourceRegistry, entry: &SourceEntry, engine: Arc<dyn QueryEngine>) -> drillsource::Result<Box<dyn Source>> {
    registry.create(&entry.kind, &entry.config, engine)
}

fn run_adapters(registry: &SourceRegistry, mode: OutputMode) -> anyhow::Result<()> {
    let mut listed = Vec::new();
    for name in registry.names() {
        let schema = registry.schema(name)?;
        listed.push((name, schema.fields.len()));
    }

    if mode.is_human() {
        ui::header(Icons::ADAPTER, "Registered adapters");
        let mut table = TableBuilder::new(["Adapter", "Fields"]);
        for (name, fields) in &listed {
            table.add_row([name.to_string(), fields.to_string()]);
        }
        println!("{}", table.build());
    } else {
        let data: Vec<_> = listed
            .iter()
            .map(|(name, fields)| serde_json::json!({ "name": name, "fields": fields }))
            .collect();
        emit_json("adapters", &data)?;
    }
    Ok(())
}

fn run_schema(registry: &SourceRegistry, adapter: &str, mode: OutputMode) -> anyhow::Result<()> {
    let schema = registry.schema(adapter)?;

    if !mode.is_human() {
        return emit_json("schema", &schema.to_json_schema());
    }

    ui::header(Icons::ADAPTER, &format!("Schema: {}", schema.name));
    let mut table = TableBuilder::new(["Field", "Type", "Required", "Default", "Description"]);
    for field in &schema.fields {
        table.add_row([
            field.name.clone(),
            field.field_type.to_string(),
            if field.optional { "no" } else { "yes" }.to_string(),
            field.default.as_ref().map(|d| d.to_string()).unwrap_or_default(),
            field.description.clone(),
        ]);
    }
    println!("{}", table.build());
    Ok(())
}

fn run_sources(registry: &SourceRegistry, config: &DrillsourceConfig, mode: OutputMode) -> anyhow::Result<()> {
    let engine = config.engine.build()?;
    let mut listed = Vec::new();
    for entry in &config.sources {
        let path = match open(registry, entry, engine.clone()) {
            Ok(source) => Ok(source.path().to_string()),
            Err(e) => Err(e.to_string()),
        };
        listed.push((entry, path));
    }

    if !mode.is_human() {
        let data: Vec<_> = listed
            .iter()
            .map(|(entry, path)| match path {
                Ok(path) => serde_json::json!({ "name": entry.name, "kind": entry.kind, "path": path }),
                Err(e) => serde_json::json!({ "name": entry.name, "kind": entry.kind, "error": e }),
            })
            .collect();
        return emit_json("sources", &data);
    }

    ui::header(Icons::ENGINE, &format!("Sources ({} engine)", engine.name()));
    if listed.is_empty() {
        println!("{}", ui::muted("No sources configured."));
        return Ok(());
    }
    let mut table = TableBuilder::new(["Name", "Kind", "Table"]);
    for (entry, path) in &listed {
        let shown = match path {
            Ok(path) => path.clone(),
            Err(e) => format!("{} {}", Icons::CROSS, e),
        };
        table.add_row([entry.name.clone(), entry.kind.clone(), shown]);
    }
    println!("{}", table.build());
    Ok(())
}

#[derive(Serialize)]
struct ValidationReport<'a> {
    name: &'a str,
    #[serde(flatten)]
    result: &'a ValidationResult,
}

fn run_validate(
    registry: &SourceRegistry,
    config: &DrillsourceConfig,
    only: Option<&str>,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let entries: Vec<&SourceEntry> = match only {
        Some(name) => vec![find_entry(config, name)?],
        None => config.sources.iter().collect(),
    };
    let engine = config.engine.build()?;

    let mut results = Vec::new();
    for entry in entries {
        let spinner = Spinner::new(&format!("Validating {}", entry.name));
        let result = match open(registry, entry, engine.clone()) {
            Ok(source) => source.validate(),
            Err(e) => ValidationResult::failure(e.to_string()),
        };
        spinner.finish();
        results.push((entry.name.clone(), result));
    }

    let failed = results.iter().filter(|(_, r)| !r.ok).count();

    if mode.is_human() {
        ui::header(Icons::SOURCE, "Validation");
        for (name, result) in &results {
            if result.ok {
                ui::success(&format!("{}: {}", name, result.message));
            } else {
                ui::error(&format!("{}: {}", name, result.message));
            }
        }
        ui::section("Summary");
        ui::summary_row("Checked", &results.len().to_string());
        ui::summary_row("Failed", &failed.to_string());
    } else {
        let data: Vec<_> = results
            .iter()
            .map(|(name, result)| ValidationReport { name, result })
            .collect();
        emit_json("validate", &data)?;
    }

    if failed > 0 {
        anyhow::bail!("{} source(s) failed validation", failed);
    }
    Ok(())
}

fn run_read(
    registry: &SourceRegistry,
    config: &DrillsourceConfig,
    name: &str,
    fields: &[String],
    offset: i64,
    limit: i64,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let entry = find_entry(config, name)?;
    let engine = config.engine.build()?;
    let source = open(registry, entry, engine)?;

    let spinner = Spinner::new(&format!("Reading {}", source.path()));
    let rows = source.get_data(fields, offset, limit, None);
    spinner.finish();
    let rows = rows?;

    if !mode.is_human() {
        return emit_json("read", &rows);
    }

    ui::header(Icons::ROWS, &format!("Rows from {}", entry.name));
    ui::status(Icons::DATABASE, "Source", &ui::path(source.path()));
    if rows.is_empty() {
        println!("{}", ui::muted("No rows."));
    } else {
        println!("{}", ui::rows_table(&rows));
        ui::info("Rows", &rows.len().to_string());
    }
    Ok(())
}
