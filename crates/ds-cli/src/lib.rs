//! Drugstore CLI library.
//!
//! This crate provides the CLI interface for the drugstore point of sale.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, CustomerAction, ItemAction, SaleAction, TaxAction};
pub use config::Config;
