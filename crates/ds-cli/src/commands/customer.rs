//! Customer commands.

use std::io::Write;

use anyhow::Result;
use ds_core::{Customer, MembershipType};
use ds_db::Database;
use serde::Serialize;
use uuid::Uuid;

/// Customer data for display.
#[derive(Debug, Serialize)]
struct CustomerEntry {
    id: Uuid,
    name: String,
    membership: MembershipType,
}

impl From<&Customer> for CustomerEntry {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id(),
            name: customer.name().to_string(),
            membership: customer.membership(),
        }
    }
}

pub fn add<W: Write>(
    writer: &mut W,
    db: &mut Database,
    name: &str,
    membership: MembershipType,
) -> Result<()> {
    let customer = Customer::new(Uuid::new_v4(), name, membership)?;
    db.insert_customer(&customer)?;
    writeln!(writer, "Added customer: {}", customer.id())?;
    Ok(())
}

pub fn list<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let customers = db.list_customers()?;
    let entries: Vec<CustomerEntry> = customers.iter().map(CustomerEntry::from).collect();

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&entries)?)?;
        return Ok(());
    }

    if entries.is_empty() {
        writeln!(writer, "No customers registered.")?;
        return Ok(());
    }

    writeln!(writer, "{:<36}  {:<24}  Membership", "ID", "Name")?;
    for entry in &entries {
        writeln!(
            writer,
            "{:<36}  {:<24}  {}",
            entry.id, entry.name, entry.membership
        )?;
    }
    Ok(())
}
