// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Keen main entry point - send events and run queries from the command line.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::Level;

use keen::config::{self, CliOptions};
use keen::telemetry::{init_telemetry, TelemetryConfig, GLOBAL_METRICS};
use keen::transport::AuthMode;
use keen::{EventBatch, Keen, Object, Value, DEFAULT_QUERY_ACTION};

/// Keen version string.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Keen - record and query analytics events.
#[derive(Parser)]
#[command(name = "keen")]
#[command(author, version, about = "Record and query Keen.IO analytics events", long_about = None)]
struct Cli {
    /// Project to record events in
    #[arg(long, env = "KEEN_PROJECT_ID", global = true)]
    project_id: Option<String>,

    /// Key authorizing event writes
    #[arg(long, env = "KEEN_WRITE_KEY", global = true, hide_env_values = true)]
    write_key: Option<String>,

    /// Key authorizing queries
    #[arg(long, env = "KEEN_READ_KEY", global = true, hide_env_values = true)]
    read_key: Option<String>,

    /// Base URL for the API
    #[arg(long, env = "KEEN_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Environment name (request logging is only honored in "development")
    #[arg(long = "env", env = "KEEN_ENV", global = true)]
    environment: Option<String>,

    /// Log every request
    #[arg(long, global = true)]
    log_requests: bool,

    /// How the API key is sent (header or query-param)
    #[arg(long, global = true)]
    auth_mode: Option<AuthMode>,

    /// Show verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for keen.
#[derive(Subcommand)]
enum Commands {
    /// Record an event
    Send {
        /// Event collection
        collection: String,

        /// Event payload as a JSON object
        #[arg(short, long)]
        data: Option<String>,

        /// Post right away instead of waiting for the batch window
        #[arg(long)]
        now: bool,
    },

    /// Record every event in a JSON file of `{collection: [events]}`
    Batch {
        /// Path to the JSON file
        file: PathBuf,
    },

    /// Run an analysis query
    Query {
        /// Analysis type (count, sum, extraction, ...)
        #[arg(default_value = DEFAULT_QUERY_ACTION)]
        action: String,

        /// Event collection to query
        #[arg(short, long)]
        collection: Option<String>,

        /// Timeframe, e.g. this_7_days
        #[arg(short, long)]
        timeframe: Option<String>,

        /// Extra query parameters as key=value (JSON values are decoded)
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },

    /// Show the resolved configuration
    Config,

    /// Initialize a new configuration file
    Init,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_options = CliOptions {
        project_id: cli.project_id,
        write_key: cli.write_key,
        read_key: cli.read_key,
        base_url: cli.base_url,
        environment: cli.environment,
        log_requests: if cli.log_requests { Some(true) } else { None },
        queue_time: None,
        auth_mode: cli.auth_mode,
    };

    let cwd = std::env::current_dir()?;
    let workspace_root = config::find_workspace_root(&cwd).unwrap_or_else(|| cwd.clone());
    let resolved = config::load_config(&workspace_root, cli_options)?;

    let telemetry = if cli.verbose {
        TelemetryConfig::development()
    } else if resolved.should_log_requests() {
        TelemetryConfig::default().with_level(Level::INFO)
    } else {
        TelemetryConfig::default()
    };
    init_telemetry(&telemetry)?;

    match cli.command {
        Commands::Send {
            collection,
            data,
            now,
        } => {
            let keen = Keen::from_config(resolved)?;
            let data = match data {
                Some(raw) => parse_object(&raw)?,
                None => Object::new(),
            };
            handle_send(&keen, &collection, data, now).await?;
        }
        Commands::Batch { file } => {
            let keen = Keen::from_config(resolved)?;
            handle_batch(&keen, &file).await?;
        }
        Commands::Query {
            action,
            collection,
            timeframe,
            params,
        } => {
            let keen = Keen::from_config(resolved)?;
            let mut data = Object::new();
            for (key, raw) in params {
                data.insert(key, parse_param_value(&raw));
            }
            if let Some(timeframe) = timeframe {
                data.insert("timeframe".to_string(), Value::String(timeframe));
            }
            let result = keen.query(&action, collection.as_deref(), data).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&resolved.redacted())?);
            if !resolved.can_write() {
                println!("{}", "Writes disabled: set a project id and write key".yellow());
            }
            if !resolved.can_read() {
                println!("{}", "Queries disabled: set a project id and read key".yellow());
            }
        }
        Commands::Init => {
            let path = config::init_config(&cwd)?;
            println!("{} {}", "✓ Created".green(), path.display());
            println!("Fill in projectId, writeKey and readKey to enable sending and queries.");
        }
        Commands::Version => {
            println!("keen {}", VERSION);
        }
    }

    if cli.verbose {
        eprintln!("{}", GLOBAL_METRICS.snapshot().format_report().dimmed());
    }

    Ok(())
}

async fn handle_send(keen: &Keen, collection: &str, data: Object, now: bool) -> anyhow::Result<()> {
    if now {
        let response = keen.send_event_immediately(collection, data).await?;
        println!("{} {}", "✓ Sent".green(), response);
        return Ok(());
    }

    if !keen.send_event(collection, data, false) {
        bail!("event not recorded: a project id and write key are required");
    }
    keen.flush().await?;
    println!("{} 1 event to {}", "✓ Sent".green(), collection.bright_white());
    Ok(())
}

async fn handle_batch(keen: &Keen, file: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let batch: EventBatch = serde_json::from_str(&content)
        .with_context(|| format!("{} must map collections to arrays of events", file.display()))?;

    let total: usize = batch.values().map(Vec::len).sum();
    let collections = batch.len();

    // Queue through the service so every event is enriched.
    for (collection, events) in batch {
        for event in events {
            if !keen.send_event(&collection, event, false) {
                bail!("events not recorded: a project id and write key are required");
            }
        }
    }
    keen.flush().await?;

    println!(
        "{} {} events across {} collections",
        "✓ Sent".green(),
        total,
        collections
    );
    Ok(())
}

fn parse_object(raw: &str) -> anyhow::Result<Object> {
    let json: serde_json::Value = serde_json::from_str(raw).context("--data must be JSON")?;
    match Value::from(json).into_object() {
        Some(object) => Ok(object),
        None => Err(anyhow!("--data must be a JSON object")),
    }
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.trim().to_string(), value.to_string()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

/// Decode a parameter value as JSON, falling back to a plain string.
fn parse_param_value(raw: &str) -> Value {
    serde_json::from_str::<serde_json::Value>(raw)
        .map(Value::from)
        .unwrap_or_else(|_| Value::String(raw.to_string()))
}
