//! Sales and their derived totals.
//!
//! A [`Sale`] aggregates lines and keeps its money figures consistent:
//! subtotal, membership discount, taxable amount, consumption tax and
//! total are recomputed after every line change. Fractions of a yen are
//! always rounded down.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::customer::Customer;
use crate::item::Item;
use crate::types::{TaxRate, ValidationError};

/// One item position on a sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleLine {
    sale_id: Uuid,
    item: Item,
    quantity: u32,
    amount: Decimal,
}

impl SaleLine {
    /// Creates a line for `quantity` units of `item`. Quantity must be at
    /// least 1; the line amount is unit price times quantity.
    pub fn new(sale_id: Uuid, item: Item, quantity: u32) -> Result<Self, ValidationError> {
        if quantity == 0 {
            return Err(ValidationError::ZeroQuantity);
        }
        let amount = item.unit_price() * Decimal::from(quantity);
        Ok(Self {
            sale_id,
            item,
            quantity,
            amount,
        })
    }

    #[must_use]
    pub const fn sale_id(&self) -> Uuid {
        self.sale_id
    }

    #[must_use]
    pub const fn item(&self) -> &Item {
        &self.item
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.amount
    }
}

/// A recorded sale with derived money figures.
#[derive(Debug, Clone)]
pub struct Sale {
    id: Uuid,
    customer: Option<Customer>,
    sold_at: DateTime<Utc>,
    lines: Vec<SaleLine>,
    subtotal: Decimal,
    discount_rate: Decimal,
    discount_amount: Decimal,
    taxable_amount: Decimal,
    tax_rate: TaxRate,
    tax_amount: Decimal,
    total: Decimal,
}

impl Sale {
    /// Starts an empty sale with a fresh id.
    ///
    /// An anonymous sale (no customer) earns no discount.
    #[must_use]
    pub fn new(customer: Option<Customer>, sold_at: DateTime<Utc>, tax_rate: TaxRate) -> Self {
        Self::from_parts(Uuid::new_v4(), customer, sold_at, tax_rate)
    }

    /// Starts an empty sale under an existing id, for rehydration from
    /// storage.
    #[must_use]
    pub fn from_parts(
        id: Uuid,
        customer: Option<Customer>,
        sold_at: DateTime<Utc>,
        tax_rate: TaxRate,
    ) -> Self {
        Self {
            id,
            customer,
            sold_at,
            lines: Vec::new(),
            subtotal: Decimal::ZERO,
            discount_rate: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            taxable_amount: Decimal::ZERO,
            tax_rate,
            tax_amount: Decimal::ZERO,
            total: Decimal::ZERO,
        }
    }

    /// Adds a line and recomputes the totals.
    ///
    /// A line for an item already on the sale folds into the existing line
    /// by summing quantities. The line must carry this sale's id.
    pub fn add_line(&mut self, line: SaleLine) -> Result<(), ValidationError> {
        if line.sale_id != self.id {
            return Err(ValidationError::SaleIdMismatch {
                expected: self.id,
                found: line.sale_id,
            });
        }
        if let Some(idx) = self.lines.iter().position(|l| l.item.id() == line.item.id()) {
            let existing = &mut self.lines[idx];
            existing.quantity += line.quantity;
            existing.amount = existing.item.unit_price() * Decimal::from(existing.quantity);
        } else {
            self.lines.push(line);
        }
        self.recompute();
        Ok(())
    }

    /// Removes the line for `item_id` and recomputes the totals.
    pub fn remove_line(&mut self, item_id: Uuid) -> Result<(), ValidationError> {
        let idx = self
            .lines
            .iter()
            .position(|l| l.item.id() == item_id)
            .ok_or(ValidationError::LineNotFound { item_id })?;
        self.lines.remove(idx);
        self.recompute();
        Ok(())
    }

    /// Rebuilds every derived figure from the lines.
    fn recompute(&mut self) {
        self.subtotal = self.lines.iter().map(SaleLine::amount).sum();
        self.discount_rate = self
            .customer
            .as_ref()
            .map_or(Decimal::ZERO, |c| c.membership().discount_rate(self.subtotal));
        self.discount_amount = (self.subtotal * self.discount_rate).floor();
        self.taxable_amount = self.subtotal - self.discount_amount;
        self.tax_amount = (self.taxable_amount * self.tax_rate.value()).floor();
        self.total = self.taxable_amount + self.tax_amount;
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    #[must_use]
    pub const fn sold_at(&self) -> DateTime<Utc> {
        self.sold_at
    }

    #[must_use]
    pub fn lines(&self) -> &[SaleLine] {
        &self.lines
    }

    #[must_use]
    pub const fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    #[must_use]
    pub const fn discount_rate(&self) -> Decimal {
        self.discount_rate
    }

    #[must_use]
    pub const fn discount_amount(&self) -> Decimal {
        self.discount_amount
    }

    #[must_use]
    pub const fn taxable_amount(&self) -> Decimal {
        self.taxable_amount
    }

    #[must_use]
    pub const fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    #[must_use]
    pub const fn tax_amount(&self) -> Decimal {
        self.tax_amount
    }

    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }
}
