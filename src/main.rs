//! Reffy command-line interface
//!
//! Maps subcommands onto the core store/validator/summarizer operations and
//! onto process exit codes: 0 for success, 1 for failures and invalid
//! manifests.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use reffy::{
    agents,
    config::ReffyConfig,
    references::ReferencesStore,
    server,
    summarize::Summarizer,
    watcher::ReferencesWatcher,
};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const REFFY_ASCII: &str = r#"             __  __
 _ __ ___   / _|/ _|_   _
| '__/ _ \ | |_| |_| | | |
| | |  __/ |  _|  _| |_| |
|_|  \___| |_| |_|  \__, |
                    |___/ "#;

#[derive(Parser)]
#[command(name = "reffy")]
#[command(version)]
#[command(about = "Repository-local reference and ideation context layer")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "REFFY_CONFIG")]
    config: Option<PathBuf>,

    /// Repository root (defaults to the current directory)
    #[arg(long, global = true, env = "REFFY_REPO")]
    repo: Option<PathBuf>,

    /// Output mode
    #[arg(long, global = true, value_enum, default_value_t = OutputMode::Text)]
    output: OutputMode,

    /// Shorthand for --output json
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputMode {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Ensure root AGENTS.md block and .references/AGENTS.md are up to date
    Init,

    /// Run init, ensure the .references structure exists, then reindex
    Bootstrap,

    /// Scan .references/artifacts and reconcile the manifest with disk
    Reindex,

    /// Validate .references/manifest.json against the manifest contract
    Validate,

    /// Generate a read-only summary of indexed artifacts
    Summarize,

    /// Serve the references store over HTTP
    Serve {
        /// Host to bind to (overrides configuration)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides configuration)
        #[arg(long)]
        port: Option<u16>,

        /// Reindex automatically when artifact files change
        #[arg(long, env = "REFFY_WATCH")]
        watch: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("reffy={},tower_http=debug", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = match &cli.config {
        Some(path) => ReffyConfig::load(path)?,
        None => ReffyConfig::default(),
    };

    let code = run(cli, config).await?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

async fn run(cli: Cli, config: ReffyConfig) -> Result<i32> {
    let output = if cli.json {
        OutputMode::Json
    } else {
        cli.output
    };
    let repo_root = match cli.repo {
        Some(path) => path,
        None => std::env::current_dir()?,
    };

    if output == OutputMode::Text {
        println!("{}\n", REFFY_ASCII);
    }

    match cli.command {
        Commands::Init => {
            let report = agents::init_agents(&repo_root).await?;
            if output == OutputMode::Json {
                print_payload("ok", "init", serde_json::to_value(&report)?);
            } else {
                println!("Updated {}", report.root_agents_path.display());
                println!("Updated {}", report.reffy_agents_path.display());
            }
            Ok(0)
        }

        Commands::Bootstrap => {
            let report = agents::init_agents(&repo_root).await?;
            let store = ReferencesStore::new(&repo_root).await?;
            let reindex = store.reconcile().await?;
            if output == OutputMode::Json {
                let mut payload = serde_json::to_value(&report)?;
                merge(&mut payload, serde_json::json!({
                    "refs_dir": store.refs_dir,
                    "manifest_path": store.manifest_path,
                    "reindex": reindex,
                }));
                print_payload("ok", "bootstrap", payload);
            } else {
                println!("Bootstrapped {}", store.refs_dir.display());
                println!("Updated {}", report.root_agents_path.display());
                println!("Updated {}", report.reffy_agents_path.display());
                println!(
                    "Reindex: added={} removed={} total={}",
                    reindex.added, reindex.removed, reindex.total
                );
            }
            Ok(0)
        }

        Commands::Reindex => {
            let store = ReferencesStore::new(&repo_root).await?;
            let report = store.reconcile().await?;
            if output == OutputMode::Json {
                print_payload("ok", "reindex", serde_json::to_value(report)?);
            } else {
                println!(
                    "Reindex complete: added={} removed={} total={}",
                    report.added, report.removed, report.total
                );
            }
            Ok(0)
        }

        Commands::Validate => {
            let store = ReferencesStore::new(&repo_root).await?;
            let result = store.validate().await;
            if output == OutputMode::Json {
                let status = if result.ok { "ok" } else { "error" };
                print_payload(status, "validate", serde_json::to_value(&result)?);
            } else if result.ok {
                println!("Manifest valid: artifacts={}", result.artifact_count);
                for warning in &result.warnings {
                    println!("warn: {}", warning);
                }
            } else {
                eprintln!("Manifest invalid: {} error(s)", result.errors.len());
                for error in &result.errors {
                    eprintln!("error: {}", error);
                }
                for warning in &result.warnings {
                    eprintln!("warn: {}", warning);
                }
            }
            Ok(if result.ok { 0 } else { 1 })
        }

        Commands::Summarize => {
            let store = ReferencesStore::new(&repo_root).await?;

            // Never summarize through a structurally broken manifest.
            let validation = store.validate().await;
            if !validation.ok {
                if output == OutputMode::Json {
                    print_payload("error", "summarize", serde_json::to_value(&validation)?);
                } else {
                    eprintln!(
                        "Cannot summarize: manifest invalid ({} error(s))",
                        validation.errors.len()
                    );
                    for error in &validation.errors {
                        eprintln!("error: {}", error);
                    }
                }
                return Ok(1);
            }

            let summary = Summarizer::new().summarize(&store).await?;
            if output == OutputMode::Json {
                print_payload("ok", "summarize", serde_json::to_value(&summary)?);
            } else {
                print_section("Themes", &summary.themes);
                println!();
                print_section("Open Questions", &summary.open_questions);
                println!();
                print_section("Candidate Changes", &summary.candidate_changes);
                println!();
                println!("Suggested Reffy References:");
                if summary.suggested_reffy_references.is_empty() {
                    println!("- (none)");
                } else {
                    for reference in &summary.suggested_reffy_references {
                        println!("- {} - {}", reference.filename, reference.reason);
                    }
                }
            }
            Ok(0)
        }

        Commands::Serve { host, port, watch } => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let store = Arc::new(ReferencesStore::new(&repo_root).await?);

            let watcher = if watch || config.watch.enabled {
                Some(ReferencesWatcher::spawn(
                    store.clone(),
                    Duration::from_millis(config.watch.debounce_ms),
                )?)
            } else {
                None
            };

            server::run(store, &config).await?;

            if let Some(watcher) = watcher {
                watcher.stop();
            }
            Ok(0)
        }
    }
}

/// Print a `{status, command, ...}` JSON payload
fn print_payload(status: &str, command: &str, body: Value) {
    let mut payload = serde_json::json!({
        "status": status,
        "command": command,
    });
    merge(&mut payload, body);
    println!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
}

/// Merge the fields of `body` into `target` (objects only)
fn merge(target: &mut Value, body: Value) {
    if let (Value::Object(target), Value::Object(body)) = (target, body) {
        for (key, value) in body {
            target.insert(key, value);
        }
    }
}

fn print_section(title: &str, values: &[String]) {
    println!("{}:", title);
    if values.is_empty() {
        println!("- (none)");
        return;
    }
    for value in values {
        println!("- {}", value);
    }
}
