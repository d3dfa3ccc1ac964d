//! Snapshot Validator CLI
//!
//! Validates table and snapshot JSON files and checks API key formats.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use strata_schemas::{ids, EngineKey, SchemaError, SchemaSnapshot, SnapshotConfig, Table};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "snapshot-validator")]
#[command(about = "Validate schema snapshots and table definitions")]
struct Cli {
    /// Path to a config file (strata.toml)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a single table definition (JSON file)
    Table {
        file: PathBuf,
        /// Engine key selecting the ruleset (defaults to the configured one)
        #[arg(short, long)]
        engine_key: Option<String>,
    },

    /// Validate a full snapshot (JSON file)
    Snapshot { file: PathBuf },

    /// Check an API key's format
    ApiKey { key: String },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = SnapshotConfig::load_from(cli.config.as_deref())?;

    match cli.command {
        Commands::Table { file, engine_key } => {
            let content = std::fs::read_to_string(&file)?;
            let table: Table = serde_json::from_str(&content)?;

            let key: EngineKey = engine_key
                .unwrap_or_else(|| config.validation.engine_key.clone())
                .parse()?;
            let ruleset = key.ruleset()?;

            match ruleset.validate(&table) {
                Ok(()) => {
                    println!("✅ {} - table \"{}\" is valid for {}", file.display(), table.name, key);
                    Ok(())
                }
                Err(issues) => {
                    println!("❌ {} - {} issue(s):", file.display(), issues.len());
                    for issue in &issues {
                        println!("  └─ {}", issue);
                    }
                    std::process::exit(1);
                }
            }
        }

        Commands::Snapshot { file } => {
            let content = std::fs::read_to_string(&file)?;
            let snapshot: SchemaSnapshot = serde_json::from_str(&content)?;

            match snapshot.validate() {
                Ok(()) => {
                    println!("✅ {} - snapshot {} is valid", file.display(), snapshot.id);
                    Ok(())
                }
                Err(SchemaError::Validation(issues)) => {
                    println!("❌ {} - {} issue(s):", file.display(), issues.len());
                    for issue in &issues {
                        println!("  └─ {}", issue);
                    }
                    std::process::exit(1);
                }
                Err(e) => Err(e.into()),
            }
        }

        Commands::ApiKey { key } => match ids::validate_api_key(&key) {
            Ok(()) => {
                println!("✅ API key format is valid");
                Ok(())
            }
            Err(issues) => {
                println!("❌ API key format is invalid:");
                for issue in &issues {
                    println!("  └─ {}", issue);
                }
                std::process::exit(1);
            }
        },
    }
}
