//! Wallposter CLI - Database migrations and storefront management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations (orders + session tables)
//! wp-cli migrate
//!
//! # Validate a catalog document before deploying it
//! wp-cli catalog check crates/storefront/static/products.json
//!
//! # Show the most recent orders
//! wp-cli orders list --limit 20
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `catalog check` - Validate a catalog JSON file
//! - `orders list` - List recent orders

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "wp-cli")]
#[command(author, version, about = "Wallposter CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Inspect catalog documents
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Inspect stored orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// Validate a catalog JSON file
    Check {
        /// Path to the catalog document
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List the most recent orders
    List {
        /// Maximum number of orders to show
        #[arg(short, long, default_value_t = 20)]
        limit: i64,
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
        Commands::Catalog { action } => match action {
            CatalogAction::Check { path } => commands::catalog::check(&path).await?,
        },
        Commands::Orders { action } => match action {
            OrdersAction::List { limit } => commands::orders::list(limit).await?,
        },
    }
    Ok(())
}
