//! Mana Arena - Development Tools

use std::path::PathBuf;
use std::sync::Arc;

use arena_core::agent::Difficulty;
use arena_core::data::CardCatalog;
use arena_tools::headless::{run_headless, HeadlessConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "arena-tools")]
#[command(about = "Development tools for Mana Arena")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a card catalog
    Validate {
        /// Path to the catalog file
        #[arg(default_value = "crates/arena_core/assets/cards.ron")]
        path: PathBuf,
    },
    /// Run a headless bot-vs-bot match and print a JSON summary
    Simulate {
        /// Match and agent seed
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// P1 bot difficulty (easy, medium, hard)
        #[arg(long, default_value = "medium")]
        p1: Difficulty,
        /// P2 bot difficulty (easy, medium, hard)
        #[arg(long, default_value = "medium")]
        p2: Difficulty,
        /// Fixed timestep in milliseconds
        #[arg(long, default_value_t = 50)]
        dt_ms: u32,
        /// Time limit in simulated seconds
        #[arg(long, default_value_t = 600)]
        max_seconds: u32,
        /// Catalog file; the built-in catalog when omitted
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => {
            tracing::info!("Validating catalog: {}", path.display());
            match arena_tools::validate::validate_catalog_file(&path) {
                Ok(count) => tracing::info!("Validation passed ({count} cards)"),
                Err(e) => {
                    tracing::error!("Validation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Simulate {
            seed,
            p1,
            p2,
            dt_ms,
            max_seconds,
            catalog,
        } => {
            let config = HeadlessConfig {
                seed,
                p1,
                p2,
                dt_ms,
                max_seconds,
                ..HeadlessConfig::default()
            };
            if let Err(e) = simulate(catalog, &config) {
                tracing::error!("Simulation failed: {e}");
                std::process::exit(1);
            }
        }
    }
}

fn simulate(catalog: Option<PathBuf>, config: &HeadlessConfig) -> arena_tools::Result<()> {
    let catalog = match catalog {
        Some(path) => {
            let text = std::fs::read_to_string(&path).map_err(|source| {
                arena_tools::ToolError::Io {
                    path: path.display().to_string(),
                    source,
                }
            })?;
            CardCatalog::from_ron_str(&text, &path.display().to_string())?
        }
        None => CardCatalog::builtin()?,
    };

    let summary = run_headless(Arc::new(catalog), config)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
