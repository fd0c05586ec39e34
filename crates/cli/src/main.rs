//! Draftline CLI - Database migrations and cache backfills.
//!
//! # Usage
//!
//! ```bash
//! # Run cache database migrations
//! draftline migrate
//!
//! # Backfill customers from Shopify
//! draftline sync customers
//!
//! # Backfill draft orders, 50 per page
//! draftline sync draft-orders --page-size 50
//!
//! # Backfill everything (customers first)
//! draftline sync all
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `sync` - Full paginated re-sync from the Shopify Admin API

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "draftline")]
#[command(author, version, about = "Draftline CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Backfill the cache from Shopify
    Sync {
        #[command(subcommand)]
        target: SyncTarget,

        /// Records per page (1-250, default `SYNC_PAGE_SIZE` or 100)
        #[arg(short, long, global = true)]
        page_size: Option<i64>,
    },
}

#[derive(Subcommand, Clone, Copy)]
enum SyncTarget {
    /// Backfill customers
    Customers,
    /// Backfill draft orders
    DraftOrders,
    /// Backfill customers, then draft orders
    All,
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
        Commands::Sync { target, page_size } => {
            let ctx = commands::sync::SyncContext::from_env(page_size).await?;
            match target {
                SyncTarget::Customers => ctx.customers().await?,
                SyncTarget::DraftOrders => ctx.draft_orders().await?,
                SyncTarget::All => {
                    ctx.customers().await?;
                    ctx.draft_orders().await?;
                }
            }
        }
    }
    Ok(())
}
