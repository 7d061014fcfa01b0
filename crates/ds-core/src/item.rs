//! Items sold over the counter.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::types::ValidationError;

/// A catalog item with its unit price in yen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    id: Uuid,
    name: String,
    unit_price: Decimal,
}

impl Item {
    /// Creates an item. The name is trimmed and must not end up empty;
    /// the unit price must not be negative.
    pub fn new(
        id: Uuid,
        name: impl Into<String>,
        unit_price: Decimal,
    ) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::Empty { field: "item name" });
        }
        if unit_price < Decimal::ZERO {
            return Err(ValidationError::NegativeUnitPrice { price: unit_price });
        }
        Ok(Self {
            id,
            name,
            unit_price,
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
    pub const fn unit_price(&self) -> Decimal {
        self.unit_price
    }
}
