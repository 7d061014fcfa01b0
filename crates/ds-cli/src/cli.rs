//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ds_core::MembershipType;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Drugstore point of sale.
///
/// Manages the item catalog, customers and the consumption tax schedule,
/// and records sales at the rate in force at the time of sale.
#[derive(Debug, Parser)]
#[command(name = "ds", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage the consumption tax schedule.
    #[command(subcommand)]
    Tax(TaxAction),

    /// Manage the item catalog.
    #[command(subcommand)]
    Item(ItemAction),

    /// Manage customers.
    #[command(subcommand)]
    Customer(CustomerAction),

    /// Record and inspect sales.
    #[command(subcommand)]
    Sale(SaleAction),
}

/// Tax schedule operations.
#[derive(Debug, Subcommand)]
pub enum TaxAction {
    /// List the tax periods covering the time axis.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Register a new tax period, splicing it into the schedule.
    Add {
        /// Period begin (RFC 3339 or YYYY-MM-DD), inclusive.
        #[arg(long)]
        begin: String,

        /// Period end (RFC 3339 or YYYY-MM-DD), exclusive.
        #[arg(long)]
        end: String,

        /// Tax rate as a decimal fraction (e.g. 0.1 for 10%).
        #[arg(long)]
        rate: Decimal,
    },

    /// Change the rate of an existing tax period.
    SetRate {
        /// Id of the period to change.
        id: Uuid,

        /// New tax rate as a decimal fraction.
        rate: Decimal,
    },

    /// Remove a tax period; its neighbors grow to close the gap.
    Remove {
        /// Id of the period to remove.
        id: Uuid,
    },
}

/// Item catalog operations.
#[derive(Debug, Subcommand)]
pub enum ItemAction {
    /// List catalog items.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Add an item to the catalog.
    Add {
        /// Item name.
        name: String,

        /// Unit price in yen.
        #[arg(long)]
        price: Decimal,
    },
}

/// Customer operations.
#[derive(Debug, Subcommand)]
pub enum CustomerAction {
    /// List registered customers.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Register a customer.
    Add {
        /// Customer name.
        name: String,

        /// Membership type (general or special).
        #[arg(long)]
        membership: MembershipType,
    },
}

/// Sale operations.
#[derive(Debug, Subcommand)]
pub enum SaleAction {
    /// List recorded sales.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Record a sale.
    Record {
        /// Customer id; omit for an anonymous sale.
        #[arg(long)]
        customer: Option<Uuid>,

        /// Sold item as ITEM_ID:QUANTITY. Repeatable.
        #[arg(long = "item", value_name = "ITEM_ID:QUANTITY", required = true)]
        items: Vec<String>,

        /// Time of sale (RFC 3339 or YYYY-MM-DD); defaults to now.
        #[arg(long)]
        at: Option<String>,
    },
}
