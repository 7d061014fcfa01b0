use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ds_cli::commands::{customer, item, sale, tax};
use ds_cli::{Cli, Commands, Config, CustomerAction, ItemAction, SaleAction, TaxAction};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(ds_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = ds_db::Database::open(&config.database_path).context("failed to open database")?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let mut stdout = std::io::stdout();

    match &cli.command {
        Some(Commands::Tax(action)) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            match action {
                TaxAction::List { json } => tax::list(&mut stdout, &db, *json)?,
                TaxAction::Add { begin, end, rate } => {
                    tax::add(&mut stdout, &mut db, begin, end, *rate)?;
                }
                TaxAction::SetRate { id, rate } => {
                    tax::set_rate(&mut stdout, &mut db, *id, *rate)?;
                }
                TaxAction::Remove { id } => tax::remove(&mut stdout, &mut db, *id)?,
            }
        }
        Some(Commands::Item(action)) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            match action {
                ItemAction::List { json } => item::list(&mut stdout, &db, *json)?,
                ItemAction::Add { name, price } => {
                    item::add(&mut stdout, &mut db, name, *price)?;
                }
            }
        }
        Some(Commands::Customer(action)) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            match action {
                CustomerAction::List { json } => customer::list(&mut stdout, &db, *json)?,
                CustomerAction::Add { name, membership } => {
                    customer::add(&mut stdout, &mut db, name, *membership)?;
                }
            }
        }
        Some(Commands::Sale(action)) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            match action {
                SaleAction::List { json } => sale::list(&mut stdout, &db, *json)?,
                SaleAction::Record {
                    customer: customer_id,
                    items,
                    at,
                } => {
                    sale::record(&mut stdout, &mut db, *customer_id, items, at.as_deref())?;
                }
            }
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
