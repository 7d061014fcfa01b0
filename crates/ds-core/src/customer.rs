//! Customers and their membership types.

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::ValidationError;

/// Subtotal at which the larger member discount tier kicks in.
const DISCOUNT_TIER_THRESHOLD: Decimal = dec!(3000);

/// Membership classes, each with its own discount tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipType {
    /// Regular member.
    General,
    /// Preferred member with deeper discounts.
    Special,
}

impl MembershipType {
    /// Numeric code used for database storage.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::General => 1,
            Self::Special => 2,
        }
    }

    /// String representation for display and parsing.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Special => "special",
        }
    }

    /// Resolves a stored membership code.
    pub fn from_code(code: i64) -> Result<Self, ValidationError> {
        match code {
            1 => Ok(Self::General),
            2 => Ok(Self::Special),
            _ => Err(ValidationError::UnknownMembershipCode { code }),
        }
    }

    /// Discount rate this membership earns on a sale subtotal.
    ///
    /// General: 5% below the tier threshold, 10% at or above it.
    /// Special: 10% below, 20% at or above.
    #[must_use]
    pub fn discount_rate(self, subtotal: Decimal) -> Decimal {
        match (self, subtotal < DISCOUNT_TIER_THRESHOLD) {
            (Self::General, true) => dec!(0.05),
            (Self::General, false) => dec!(0.10),
            (Self::Special, true) => dec!(0.10),
            (Self::Special, false) => dec!(0.20),
        }
    }
}

impl fmt::Display for MembershipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MembershipType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(Self::General),
            "special" => Ok(Self::Special),
            _ => Err(ValidationError::UnknownMembership {
                value: s.to_string(),
            }),
        }
    }
}

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    id: Uuid,
    name: String,
    membership: MembershipType,
}

impl Customer {
    /// Creates a customer. The name is trimmed and must not end up empty.
    pub fn new(
        id: Uuid,
        name: impl Into<String>,
        membership: MembershipType,
    ) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::Empty {
                field: "customer name",
            });
        }
        Ok(Self {
            id,
            name,
            membership,
        })
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn membership(&self) -> MembershipType {
        self.membership
    }
}
