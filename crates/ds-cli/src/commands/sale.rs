//! Sale commands.
//!
//! `record` is the checkout flow: resolve the customer, look the sold
//! items up in the catalog, ask the tax schedule for the rate in force at
//! the time of sale, and persist the finished aggregate.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use ds_core::{Sale, SaleLine};
use ds_db::Database;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::tax::load_schedule;
use super::util::parse_instant;

/// A sold item reference from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoldItem {
    pub item_id: Uuid,
    pub quantity: u32,
}

/// Parses `ITEM_ID:QUANTITY`.
fn parse_sold_item(raw: &str) -> Result<SoldItem> {
    let Some((id, quantity)) = raw.split_once(':') else {
        bail!("invalid sold item: {raw} (expected ITEM_ID:QUANTITY)");
    };
    let item_id = id
        .parse()
        .with_context(|| format!("invalid item id in: {raw}"))?;
    let quantity = quantity
        .parse()
        .with_context(|| format!("invalid quantity in: {raw}"))?;
    Ok(SoldItem { item_id, quantity })
}

/// One line of a sale for display.
#[derive(Debug, Serialize)]
struct LineEntry {
    item: String,
    quantity: u32,
    amount: Decimal,
}

/// Sale data for display.
#[derive(Debug, Serialize)]
struct SaleEntry {
    id: Uuid,
    customer: Option<String>,
    sold_at: DateTime<Utc>,
    lines: Vec<LineEntry>,
    subtotal: Decimal,
    discount_rate: Decimal,
    discount_amount: Decimal,
    taxable_amount: Decimal,
    tax_rate: Decimal,
    tax_amount: Decimal,
    total: Decimal,
}

impl From<&Sale> for SaleEntry {
    fn from(sale: &Sale) -> Self {
        Self {
            id: sale.id(),
            customer: sale.customer().map(|c| c.name().to_string()),
            sold_at: sale.sold_at(),
            lines: sale
                .lines()
                .iter()
                .map(|line| LineEntry {
                    item: line.item().name().to_string(),
                    quantity: line.quantity(),
                    amount: line.amount(),
                })
                .collect(),
            subtotal: sale.subtotal(),
            discount_rate: sale.discount_rate(),
            discount_amount: sale.discount_amount(),
            taxable_amount: sale.taxable_amount(),
            tax_rate: sale.tax_rate().value(),
            tax_amount: sale.tax_amount(),
            total: sale.total(),
        }
    }
}

fn write_receipt<W: Write>(writer: &mut W, sale: &Sale) -> Result<()> {
    writeln!(writer, "Recorded sale: {}", sale.id())?;
    if let Some(customer) = sale.customer() {
        writeln!(writer, "Customer: {} ({})", customer.name(), customer.membership())?;
    }
    for line in sale.lines() {
        writeln!(
            writer,
            "  {} x {} @ {} = {}",
            line.quantity(),
            line.item().name(),
            line.item().unit_price(),
            line.amount(),
        )?;
    }
    writeln!(writer, "Subtotal:       {:>10}", sale.subtotal().to_string())?;
    writeln!(
        writer,
        "Discount:       {:>10}  (rate {})",
        sale.discount_amount().to_string(),
        sale.discount_rate(),
    )?;
    writeln!(writer, "Taxable amount: {:>10}", sale.taxable_amount().to_string())?;
    writeln!(
        writer,
        "Tax:            {:>10}  (rate {})",
        sale.tax_amount().to_string(),
        sale.tax_rate(),
    )?;
    writeln!(writer, "Total:          {:>10}", sale.total().to_string())?;
    Ok(())
}

pub fn record<W: Write>(
    writer: &mut W,
    db: &mut Database,
    customer_id: Option<Uuid>,
    sold_items: &[String],
    at: Option<&str>,
) -> Result<()> {
    let sold_at = match at {
        Some(value) => parse_instant(value)?,
        None => Utc::now(),
    };

    let customer = match customer_id {
        Some(id) => {
            let found = db
                .find_customer(id)?
                .with_context(|| format!("no customer with id {id}"))?;
            Some(found)
        }
        None => None,
    };

    // The rate in force at the time of sale is authoritative for the whole
    // transaction.
    let schedule = load_schedule(db)?;
    let rate = schedule.rate_at(sold_at)?;

    let mut sale = Sale::new(customer, sold_at, rate);
    for raw in sold_items {
        let sold = parse_sold_item(raw)?;
        let item = db
            .find_item(sold.item_id)?
            .with_context(|| format!("no item with id {}", sold.item_id))?;
        sale.add_line(SaleLine::new(sale.id(), item, sold.quantity)?)?;
    }
    if sale.lines().is_empty() {
        bail!("a sale needs at least one item");
    }

    db.insert_sale(&sale)?;
    write_receipt(writer, &sale)?;
    Ok(())
}

pub fn list<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let sales = db.list_sales()?;
    let entries: Vec<SaleEntry> = sales.iter().map(SaleEntry::from).collect();

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&entries)?)?;
        return Ok(());
    }

    if entries.is_empty() {
        writeln!(writer, "No sales recorded.")?;
        return Ok(());
    }

    writeln!(
        writer,
        "{:<36}  {:<20}  {:<16}  {:>8}",
        "ID", "Sold at", "Customer", "Total"
    )?;
    for entry in &entries {
        writeln!(
            writer,
            "{:<36}  {:<20}  {:<16}  {:>8}",
            entry.id,
            entry.sold_at.format("%Y-%m-%dT%H:%M:%SZ"),
            entry.customer.as_deref().unwrap_or("(anonymous)"),
            entry.total,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ds_core::{Customer, Item, MembershipType};
    use rust_decimal_macros::dec;

    use super::super::tax;
    use super::*;

    fn seeded_db() -> (Database, Customer, Item, Item) {
        let mut db = Database::open_in_memory().unwrap();
        let mut out = Vec::new();
        // [MIN, Jun 1) 10%, [Jun 1, Sep 1) 15%, [Sep 1, MAX) 10%
        tax::add(&mut out, &mut db, "2024-04-01", "2024-06-01", dec!(0.1)).unwrap();
        tax::add(&mut out, &mut db, "2024-06-01", "2024-09-01", dec!(0.15)).unwrap();

        let customer =
            Customer::new(Uuid::new_v4(), "Yamada Taro", MembershipType::General).unwrap();
        let vantelin = Item::new(Uuid::new_v4(), "Vantelin", dec!(999)).unwrap();
        let bufferin = Item::new(Uuid::new_v4(), "Bufferin", dec!(500)).unwrap();
        db.insert_customer(&customer).unwrap();
        db.insert_item(&vantelin).unwrap();
        db.insert_item(&bufferin).unwrap();
        (db, customer, vantelin, bufferin)
    }

    #[test]
    fn parse_sold_item_accepts_id_and_quantity() {
        let id = Uuid::new_v4();
        let sold = parse_sold_item(&format!("{id}:3")).unwrap();
        assert_eq!(sold, SoldItem { item_id: id, quantity: 3 });
    }

    #[test]
    fn parse_sold_item_rejects_malformed_input() {
        assert!(parse_sold_item("not-a-uuid:1").is_err());
        assert!(parse_sold_item("no-quantity").is_err());
        let id = Uuid::new_v4();
        assert!(parse_sold_item(&format!("{id}:many")).is_err());
    }

    #[test]
    fn record_applies_the_rate_in_force() {
        let (mut db, customer, vantelin, bufferin) = seeded_db();
        let mut out = Vec::new();
        let items = vec![
            format!("{}:1", vantelin.id()),
            format!("{}:4", bufferin.id()),
        ];

        record(
            &mut out,
            &mut db,
            Some(customer.id()),
            &items,
            Some("2024-05-01"),
        )
        .unwrap();

        let sales = db.list_sales().unwrap();
        assert_eq!(sales.len(), 1);
        // 2,999 - 149 discount = 2,850; 10% tax = 285
        assert_eq!(sales[0].tax_rate().value(), dec!(0.1));
        assert_eq!(sales[0].total(), dec!(3135));
        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("Total:"));
        assert!(output.contains("3135"));
    }

    #[test]
    fn record_uses_the_later_period_after_its_begin() {
        let (mut db, _, vantelin, _) = seeded_db();
        let mut out = Vec::new();
        let items = vec![format!("{}:1", vantelin.id())];

        record(&mut out, &mut db, None, &items, Some("2024-07-15")).unwrap();

        let sales = db.list_sales().unwrap();
        assert_eq!(sales[0].tax_rate().value(), dec!(0.15));
    }

    #[test]
    fn record_rejects_unknown_customer() {
        let (mut db, _, vantelin, _) = seeded_db();
        let mut out = Vec::new();
        let items = vec![format!("{}:1", vantelin.id())];

        let result = record(
            &mut out,
            &mut db,
            Some(Uuid::new_v4()),
            &items,
            Some("2024-05-01"),
        );

        assert!(result.is_err());
        assert!(db.list_sales().unwrap().is_empty());
    }

    #[test]
    fn record_rejects_unknown_item() {
        let (mut db, customer, _, _) = seeded_db();
        let mut out = Vec::new();
        let items = vec![format!("{}:1", Uuid::new_v4())];

        let result = record(
            &mut out,
            &mut db,
            Some(customer.id()),
            &items,
            Some("2024-05-01"),
        );

        assert!(result.is_err());
        assert!(db.list_sales().unwrap().is_empty());
    }

    #[test]
    fn list_renders_recorded_sales() {
        let (mut db, customer, vantelin, _) = seeded_db();
        let mut out = Vec::new();
        let items = vec![format!("{}:2", vantelin.id())];
        record(
            &mut out,
            &mut db,
            Some(customer.id()),
            &items,
            Some("2024-05-01"),
        )
        .unwrap();

        let mut human = Vec::new();
        list(&mut human, &db, false).unwrap();
        let human = String::from_utf8(human).unwrap();
        assert!(human.contains("Yamada Taro"));

        let mut json = Vec::new();
        list(&mut json, &db, true).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 1);
    }
}
