//! PeopleCart CLI - Database migrations and sample data.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! pc-cli migrate
//!
//! # Load the bundled sample catalog (5 categories, 8 books)
//! pc-cli seed
//!
//! # Load a catalog from a YAML file
//! pc-cli seed --file catalog.yaml
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pc-cli")]
#[command(author, version, about = "PeopleCart CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Insert sample categories and books (idempotent)
    Seed {
        /// YAML catalog to load instead of the bundled sample
        #[arg(short, long)]
        file: Option<String>,
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
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { file } => commands::seed::catalog(file.as_deref()).await?,
    }
    Ok(())
}
