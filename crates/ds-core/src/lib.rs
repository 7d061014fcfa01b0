//! Core domain logic for the drugstore point of sale.
//!
//! This crate contains the fundamental types and logic for:
//! - Tax schedule: a gapless partition of the time axis into rate periods,
//!   with point-in-time rate lookup and splice/merge editing
//! - Catalog: validated items and customers with membership types
//! - Sales: line aggregation, membership discounts and tax totals

pub mod customer;
pub mod item;
pub mod sale;
pub mod tax_period;
pub mod tax_schedule;
pub mod types;

pub use customer::{Customer, MembershipType};
pub use item::Item;
pub use sale::{Sale, SaleLine};
pub use tax_period::{MAX_INSTANT, MIN_INSTANT, TaxPeriod};
pub use tax_schedule::{ScheduleError, TaxSchedule};
pub use types::{TaxRate, ValidationError};
