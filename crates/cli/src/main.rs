//! Comptoir CLI - Database migrations, catalog seeding and stock reports.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! comptoir-cli migrate
//!
//! # Seed categories, expeditions and articles from YAML
//! comptoir-cli seed catalog.yaml
//!
//! # List articles with 3 units or fewer
//! comptoir-cli stock-report --threshold 3
//! ```
//!
//! Every command reads `DATABASE_URL` from the environment or `.env`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use comptoir_admin::models::article::DEFAULT_LOW_STOCK_THRESHOLD;

mod commands;

#[derive(Parser)]
#[command(name = "comptoir-cli")]
#[command(author, version, about = "Comptoir CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the catalog from a YAML file, skipping existing records
    Seed {
        /// Path to the catalog file
        file: String,
    },
    /// Log articles whose stock is at or below a threshold
    StockReport {
        /// Stock level at or below which an article is reported
        #[arg(short, long, default_value_t = DEFAULT_LOW_STOCK_THRESHOLD)]
        threshold: i32,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::Seed { file } => commands::seed::run(&file).await,
        Commands::StockReport { threshold } => commands::stock_report::run(threshold).await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_stock_report_default_threshold() {
        let cli = Cli::try_parse_from(["comptoir-cli", "stock-report"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::StockReport { threshold } if threshold == DEFAULT_LOW_STOCK_THRESHOLD
        ));
    }

    #[test]
    fn test_seed_requires_file() {
        assert!(Cli::try_parse_from(["comptoir-cli", "seed"]).is_err());
    }
}
