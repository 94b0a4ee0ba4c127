//! Marram CLI - database migrations and shipping data seeding.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! marram migrate
//!
//! # Seed shipping zones, methods, and carriers from a fixture
//! marram seed --file crates/cli/fixtures/shipping.yaml
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed shipping configuration and demo catalog data

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "marram")]
#[command(author, version, about = "Marram CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed shipping configuration and demo catalog data
    Seed {
        /// Fixture file with carriers, zones, methods, and products
        #[arg(short, long, default_value = "crates/cli/fixtures/shipping.yaml")]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => commands::seed::run(&file).await?,
    }
    Ok(())
}
