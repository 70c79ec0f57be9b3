mod browse;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shopview")]
#[command(about = "Browse a storefront catalog from the command line")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load a view and print the visible page of products
    Browse {
        /// View profile name (e.g., category, search, new-arrivals)
        #[arg(long, default_value = "category")]
        view: String,
        /// Query string as it would appear in the address bar
        #[arg(long)]
        address: Option<String>,
        /// Route category for category views
        #[arg(long)]
        category: Option<i64>,
        /// Jump to this page after the first load
        #[arg(long)]
        page: Option<u32>,
    },
    /// Print the category tree
    Tree,
    /// List the configured view profiles
    Views,
    /// Print the canonical form of a query string
    Canonicalize {
        /// Query string, with or without the leading `?`
        query: String,
    },
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Browse {
            view,
            address,
            category,
            page,
        }) => {
            let config = shopview_core::load_app_config()?;
            init_tracing(&config.log_level);
            browse::run_browse(&config, &view, address.as_deref(), category, page).await?;
        }
        Some(Commands::Tree) => {
            let config = shopview_core::load_app_config()?;
            init_tracing(&config.log_level);
            browse::run_tree(&config).await?;
        }
        Some(Commands::Views) => {
            let config = shopview_core::load_app_config()?;
            init_tracing(&config.log_level);
            browse::run_views(&config)?;
        }
        Some(Commands::Canonicalize { query }) => {
            init_tracing("warn");
            println!("{}", browse::canonicalize(&query));
        }
        None => println!("no command given; try `shopview --help`"),
    }

    Ok(())
}

#[cfg(test)]
mod tests;
