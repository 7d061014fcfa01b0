//! Item catalog commands.

use std::io::Write;

use anyhow::Result;
use ds_core::Item;
use ds_db::Database;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Item data for display.
#[derive(Debug, Serialize)]
struct ItemEntry {
    id: Uuid,
    name: String,
    price: Decimal,
}

impl From<&Item> for ItemEntry {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id(),
            name: item.name().to_string(),
            price: item.unit_price(),
        }
    }
}

pub fn add<W: Write>(writer: &mut W, db: &mut Database, name: &str, price: Decimal) -> Result<()> {
    let item = Item::new(Uuid::new_v4(), name, price)?;
    db.insert_item(&item)?;
    writeln!(writer, "Added item: {}", item.id())?;
    Ok(())
}

pub fn list<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let items = db.list_items()?;
    let entries: Vec<ItemEntry> = items.iter().map(ItemEntry::from).collect();

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&entries)?)?;
        return Ok(());
    }

    if entries.is_empty() {
        writeln!(writer, "No items in the catalog.")?;
        return Ok(());
    }

    writeln!(writer, "{:<36}  {:<24}  Price", "ID", "Name")?;
    for entry in &entries {
        writeln!(
            writer,
            "{:<36}  {:<24}  {}",
            entry.id, entry.name, entry.price
        )?;
    }
    Ok(())
}
