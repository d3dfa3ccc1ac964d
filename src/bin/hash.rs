//! Snapshot Hash CLI
//!
//! Computes and verifies snapshot content hashes.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use strata_schemas::SchemaSnapshot;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "snapshot-hash")]
#[command(about = "Compute or verify snapshot content hashes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the content hash of a snapshot (JSON file)
    Compute { file: PathBuf },

    /// Verify a snapshot's stored contentHash against its content
    Verify { file: PathBuf },
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
    match cli.command {
        Commands::Compute { file } => {
            let content = std::fs::read_to_string(&file)?;
            let snapshot: SchemaSnapshot = serde_json::from_str(&content)?;
            println!("{}", snapshot.compute_hash()?);
            Ok(())
        }

        Commands::Verify { file } => {
            let content = std::fs::read_to_string(&file)?;
            let snapshot: SchemaSnapshot = serde_json::from_str(&content)?;

            match &snapshot.content_hash {
                None => {
                    println!("❌ {} - snapshot carries no contentHash", file.display());
                    std::process::exit(1);
                }
                Some(stored) => {
                    if snapshot.verify_hash()? {
                        println!("✅ {} - contentHash matches ({})", file.display(), stored);
                        Ok(())
                    } else {
                        println!(
                            "❌ {} - contentHash mismatch: stored {}, computed {}",
                            file.display(),
                            stored,
                            snapshot.compute_hash()?
                        );
                        std::process::exit(1);
                    }
                }
            }
        }
    }
}
