//! Core type definitions with validation.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The tax rate was out of range.
    #[error("tax rate must be at least 0 and below 1, got {value}")]
    RateOutOfRange { value: Decimal },

    /// A period begin outside the managed time axis.
    #[error("period begin {begin} is outside the managed time axis")]
    BeginOutOfRange { begin: DateTime<Utc> },

    /// A period end outside the managed time axis.
    #[error("period end {end} is outside the managed time axis")]
    EndOutOfRange { end: DateTime<Utc> },

    /// A period whose begin does not precede its end.
    #[error("period begin {begin} must precede end {end}")]
    EmptySpan {
        begin: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// An item priced below zero.
    #[error("unit price cannot be negative, got {price}")]
    NegativeUnitPrice { price: Decimal },

    /// A sale line with nothing sold.
    #[error("sale line quantity must be at least 1")]
    ZeroQuantity,

    /// A membership type code not present in the catalog.
    #[error("unknown membership type code: {code}")]
    UnknownMembershipCode { code: i64 },

    /// A membership type name not present in the catalog.
    #[error("unknown membership type: {value}")]
    UnknownMembership { value: String },

    /// A sale line built for a different sale.
    #[error("sale line belongs to sale {found}, expected {expected}")]
    SaleIdMismatch { expected: Uuid, found: Uuid },

    /// No sale line for the given item.
    #[error("no sale line for item {item_id}")]
    LineNotFound { item_id: Uuid },
}

/// A consumption tax rate in the range \[0, 1).
///
/// Rates are exact decimals; a 10% tax is `0.1`. The upper bound is
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct TaxRate(Decimal);

impl TaxRate {
    /// The zero rate.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new rate after validation.
    ///
    /// Returns an error if the value is outside \[0, 1).
    pub fn new(value: Decimal) -> Result<Self, ValidationError> {
        if value < Decimal::ZERO || value >= Decimal::ONE {
            return Err(ValidationError::RateOutOfRange { value });
        }
        Ok(Self(value))
    }

    /// Returns the inner decimal value.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for TaxRate {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TaxRate> for Decimal {
    fn from(rate: TaxRate) -> Self {
        rate.0
    }
}
