//! Tax schedule commands.
//!
//! Each mutation follows the same shape: load the stored period list,
//! rebuild the schedule, apply the edit, then write the whole list back.
//! Splits and merges can touch arbitrarily many rows, so the store always
//! gets a full replacement.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use ds_core::{TaxPeriod, TaxRate, TaxSchedule};
use ds_db::Database;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::util::parse_instant;

/// Tax period data for display.
#[derive(Debug, Serialize)]
struct PeriodEntry {
    id: Uuid,
    begin: DateTime<Utc>,
    end: DateTime<Utc>,
    rate: Decimal,
}

impl From<&TaxPeriod> for PeriodEntry {
    fn from(period: &TaxPeriod) -> Self {
        Self {
            id: period.id(),
            begin: period.begin(),
            end: period.end(),
            rate: period.rate().value(),
        }
    }
}

/// Rebuilds the schedule from storage.
pub(crate) fn load_schedule(db: &Database) -> Result<TaxSchedule> {
    let periods = db.list_tax_periods()?;
    TaxSchedule::new(periods).context("stored tax periods do not form a valid schedule")
}

pub fn list<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let periods = db.list_tax_periods()?;
    let entries: Vec<PeriodEntry> = periods.iter().map(PeriodEntry::from).collect();

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&entries)?)?;
        return Ok(());
    }

    if entries.is_empty() {
        writeln!(writer, "No tax periods registered.")?;
        writeln!(writer, "Hint: run 'ds tax add' to register the first one.")?;
        return Ok(());
    }

    writeln!(
        writer,
        "{:<36}  {:<20}  {:<20}  Rate",
        "ID", "Begin", "End"
    )?;
    for entry in &entries {
        writeln!(
            writer,
            "{:<36}  {:<20}  {:<20}  {}",
            entry.id,
            entry.begin.format("%Y-%m-%dT%H:%M:%SZ"),
            entry.end.format("%Y-%m-%dT%H:%M:%SZ"),
            entry.rate,
        )?;
    }
    Ok(())
}

pub fn add<W: Write>(
    writer: &mut W,
    db: &mut Database,
    begin: &str,
    end: &str,
    rate: Decimal,
) -> Result<()> {
    let begin = parse_instant(begin)?;
    let end = parse_instant(end)?;
    let rate = TaxRate::new(rate)?;
    let period = TaxPeriod::new(Uuid::new_v4(), begin, end, rate)?;
    let id = period.id();

    let stored = db.list_tax_periods()?;
    let schedule = if stored.is_empty() {
        // First period ever: it covers the whole axis by itself.
        TaxSchedule::new(vec![period])?
    } else {
        let mut schedule =
            TaxSchedule::new(stored).context("stored tax periods do not form a valid schedule")?;
        schedule.insert(period);
        schedule
    };
    db.replace_tax_periods(schedule.periods())?;

    writeln!(writer, "Registered tax period: {id}")?;
    writeln!(
        writer,
        "Tax schedule now has {} period(s)",
        schedule.periods().len()
    )?;
    Ok(())
}

pub fn set_rate<W: Write>(
    writer: &mut W,
    db: &mut Database,
    id: Uuid,
    rate: Decimal,
) -> Result<()> {
    let mut schedule = load_schedule(db)?;
    schedule.set_rate(id, rate)?;
    db.replace_tax_periods(schedule.periods())?;

    writeln!(writer, "Updated tax period: {id}")?;
    writeln!(
        writer,
        "Tax schedule now has {} period(s)",
        schedule.periods().len()
    )?;
    Ok(())
}

pub fn remove<W: Write>(writer: &mut W, db: &mut Database, id: Uuid) -> Result<()> {
    let mut schedule = load_schedule(db)?;
    schedule.remove(id)?;
    db.replace_tax_periods(schedule.periods())?;

    writeln!(writer, "Removed tax period: {id}")?;
    writeln!(
        writer,
        "Tax schedule now has {} period(s)",
        schedule.periods().len()
    )?;
    Ok(())
}
