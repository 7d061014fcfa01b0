//! Storage layer for the drugstore point of sale.
//!
//! Provides persistence for the item catalog, customers, the consumption
//! tax schedule and recorded sales using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but
//! not `Sync`. A `Database` instance can be moved between threads but cannot
//! be shared across threads without external synchronization.
//!
//! # Schema
//!
//! Timestamps are stored as TEXT in RFC 3339 format (e.g.,
//! `2024-01-15T10:30:00Z`), so lexicographic ordering matches chronological
//! ordering and values stay human-readable. SQLite has no decimal type:
//! tax rates are stored scaled by 10,000 as INTEGER, unit prices as INTEGER
//! yen.
//!
//! Tax periods are always written as a full-list replacement. A schedule
//! edit can split, trim or merge arbitrarily many periods, so there is no
//! meaningful per-row upsert.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use ds_core::{
    Customer, Item, MembershipType, Sale, SaleLine, TaxPeriod, TaxRate, ValidationError,
};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use thiserror::Error;
use uuid::Uuid;

/// Stored rates are multiplied by this before hitting the INTEGER column.
const RATE_SCALE: i64 = 10_000;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A stored timestamp failed to parse.
    #[error("invalid timestamp in {column}: {value}")]
    TimestampParse {
        column: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// A stored id failed to parse.
    #[error("invalid id in {column}: {value}")]
    IdParse {
        column: &'static str,
        value: String,
        #[source]
        source: uuid::Error,
    },

    /// A stored value failed domain validation.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection
    /// closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS items (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                unit_price INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS customers (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                membership_type_code INTEGER NOT NULL
            );

            -- begin_at/end_at: RFC 3339 TEXT; rate: scaled by 10,000
            CREATE TABLE IF NOT EXISTS tax_periods (
                id TEXT PRIMARY KEY,
                begin_at TEXT NOT NULL,
                end_at TEXT NOT NULL,
                rate INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tax_periods_begin ON tax_periods(begin_at);

            CREATE TABLE IF NOT EXISTS sales (
                id TEXT PRIMARY KEY,
                customer_id TEXT,
                sold_at TEXT NOT NULL,
                tax_rate INTEGER NOT NULL,
                FOREIGN KEY (customer_id) REFERENCES customers(id)
            );

            CREATE INDEX IF NOT EXISTS idx_sales_sold_at ON sales(sold_at);

            CREATE TABLE IF NOT EXISTS sale_lines (
                sale_id TEXT NOT NULL,
                item_id TEXT NOT NULL,
                quantity INTEGER NOT NULL,
                PRIMARY KEY (sale_id, item_id),
                FOREIGN KEY (sale_id) REFERENCES sales(id) ON DELETE CASCADE,
                FOREIGN KEY (item_id) REFERENCES items(id)
            );
            ",
        )?;
        Ok(())
    }

    // ========== Items ==========

    /// Inserts a catalog item.
    pub fn insert_item(&mut self, item: &Item) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO items (id, name, unit_price) VALUES (?, ?, ?)",
            params![
                item.id().to_string(),
                item.name(),
                price_to_stored(item.unit_price()),
            ],
        )?;
        Ok(())
    }

    /// Lists all items ordered by name.
    pub fn list_items(&self) -> Result<Vec<Item>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, unit_price FROM items ORDER BY name ASC, id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;
        let mut items = Vec::new();
        for row in rows {
            let (id, name, unit_price) = row?;
            items.push(item_from_row(&id, name, unit_price)?);
        }
        Ok(items)
    }

    /// Looks up an item by id.
    pub fn find_item(&self, id: Uuid) -> Result<Option<Item>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, unit_price FROM items WHERE id = ?",
                [id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;
        match row {
            Some((id, name, unit_price)) => Ok(Some(item_from_row(&id, name, unit_price)?)),
            None => Ok(None),
        }
    }

    // ========== Customers ==========

    /// Inserts a customer.
    pub fn insert_customer(&mut self, customer: &Customer) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO customers (id, name, membership_type_code) VALUES (?, ?, ?)",
            params![
                customer.id().to_string(),
                customer.name(),
                customer.membership().code(),
            ],
        )?;
        Ok(())
    }

    /// Lists all customers ordered by name.
    pub fn list_customers(&self) -> Result<Vec<Customer>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, membership_type_code FROM customers ORDER BY name ASC, id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;
        let mut customers = Vec::new();
        for row in rows {
            let (id, name, code) = row?;
            customers.push(customer_from_row(&id, name, code)?);
        }
        Ok(customers)
    }

    /// Looks up a customer by id.
    pub fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, DbError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, membership_type_code FROM customers WHERE id = ?",
                [id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;
        match row {
            Some((id, name, code)) => Ok(Some(customer_from_row(&id, name, code)?)),
            None => Ok(None),
        }
    }

    // ========== Tax periods ==========

    /// Lists all tax periods ordered by begin.
    pub fn list_tax_periods(&self) -> Result<Vec<TaxPeriod>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, begin_at, end_at, rate FROM tax_periods ORDER BY begin_at ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;
        let mut periods = Vec::new();
        for row in rows {
            let (id, begin, end, rate) = row?;
            let id = parse_id("tax_periods.id", &id)?;
            let begin = parse_instant("tax_periods.begin_at", &begin)?;
            let end = parse_instant("tax_periods.end_at", &end)?;
            let rate = TaxRate::new(rate_from_stored(rate))?;
            periods.push(TaxPeriod::new(id, begin, end, rate)?);
        }
        Ok(periods)
    }

    /// Replaces the whole stored tax period list in one transaction.
    pub fn replace_tax_periods(&mut self, periods: &[TaxPeriod]) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM tax_periods", [])?;
        {
            let mut stmt = tx
                .prepare("INSERT INTO tax_periods (id, begin_at, end_at, rate) VALUES (?, ?, ?, ?)")?;
            for period in periods {
                stmt.execute(params![
                    period.id().to_string(),
                    format_instant(period.begin()),
                    format_instant(period.end()),
                    rate_to_stored(period.rate()),
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(count = periods.len(), "replaced tax period list");
        Ok(())
    }

    // ========== Sales ==========

    /// Inserts a sale and its lines in one transaction.
    pub fn insert_sale(&mut self, sale: &Sale) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO sales (id, customer_id, sold_at, tax_rate) VALUES (?, ?, ?, ?)",
            params![
                sale.id().to_string(),
                sale.customer().map(|c| c.id().to_string()),
                format_instant(sale.sold_at()),
                rate_to_stored(sale.tax_rate()),
            ],
        )?;
        {
            let mut stmt = tx
                .prepare("INSERT INTO sale_lines (sale_id, item_id, quantity) VALUES (?, ?, ?)")?;
            for line in sale.lines() {
                stmt.execute(params![
                    sale.id().to_string(),
                    line.item().id().to_string(),
                    line.quantity(),
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(sale_id = %sale.id(), lines = sale.lines().len(), "recorded sale");
        Ok(())
    }

    /// Lists all sales, oldest first, rebuilding each aggregate from its
    /// stored lines.
    ///
    /// Derived figures are recomputed through the domain constructors
    /// rather than read back from storage.
    pub fn list_sales(&self) -> Result<Vec<Sale>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT
                s.id,
                s.customer_id,
                c.name,
                c.membership_type_code,
                s.sold_at,
                s.tax_rate,
                l.item_id,
                i.name,
                i.unit_price,
                l.quantity
            FROM sales s
            LEFT OUTER JOIN customers c ON c.id = s.customer_id
            INNER JOIN sale_lines l ON l.sale_id = s.id
            INNER JOIN items i ON i.id = l.item_id
            ORDER BY s.sold_at ASC, s.id ASC, i.name ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(RawSaleLine {
                sale_id: row.get(0)?,
                customer_id: row.get(1)?,
                customer_name: row.get(2)?,
                membership_type_code: row.get(3)?,
                sold_at: row.get(4)?,
                tax_rate: row.get(5)?,
                item_id: row.get(6)?,
                item_name: row.get(7)?,
                item_unit_price: row.get(8)?,
                quantity: row.get(9)?,
            })
        })?;

        let mut sales: Vec<Sale> = Vec::new();
        for row in rows {
            let raw = row?;
            if sales.last().is_none_or(|s| s.id().to_string() != raw.sale_id) {
                sales.push(raw.start_sale()?);
            }
            let sale = sales
                .last_mut()
                .expect("a sale was just pushed for this row");
            sale.add_line(raw.into_line(sale.id())?)?;
        }
        Ok(sales)
    }
}

/// One row of the sale reconstruction join.
struct RawSaleLine {
    sale_id: String,
    customer_id: Option<String>,
    customer_name: Option<String>,
    membership_type_code: Option<i64>,
    sold_at: String,
    tax_rate: i64,
    item_id: String,
    item_name: String,
    item_unit_price: i64,
    quantity: u32,
}

impl RawSaleLine {
    /// Builds the empty sale aggregate this row belongs to.
    fn start_sale(&self) -> Result<Sale, DbError> {
        let id = parse_id("sales.id", &self.sale_id)?;
        let customer = match (&self.customer_id, &self.customer_name, self.membership_type_code) {
            (Some(customer_id), Some(name), Some(code)) => {
                let customer_id = parse_id("sales.customer_id", customer_id)?;
                let membership = MembershipType::from_code(code)?;
                Some(Customer::new(customer_id, name.clone(), membership)?)
            }
            _ => None,
        };
        let sold_at = parse_instant("sales.sold_at", &self.sold_at)?;
        let tax_rate = TaxRate::new(rate_from_stored(self.tax_rate))?;
        Ok(Sale::from_parts(id, customer, sold_at, tax_rate))
    }

    /// Builds this row's sale line.
    fn into_line(self, sale_id: Uuid) -> Result<SaleLine, DbError> {
        let item_id = parse_id("sale_lines.item_id", &self.item_id)?;
        let item = Item::new(item_id, self.item_name, Decimal::from(self.item_unit_price))?;
        Ok(SaleLine::new(sale_id, item, self.quantity)?)
    }
}

/// Formats a timestamp for storage.
fn format_instant(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parses a stored timestamp.
fn parse_instant(column: &'static str, value: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            column,
            value: value.to_string(),
            source,
        })
}

/// Parses a stored id.
fn parse_id(column: &'static str, value: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(value).map_err(|source| DbError::IdParse {
        column,
        value: value.to_string(),
        source,
    })
}

fn rate_to_stored(rate: TaxRate) -> i64 {
    // Rates are below 1, so the scaled value always fits.
    (rate.value() * Decimal::from(RATE_SCALE))
        .trunc()
        .to_i64()
        .expect("rate scaled by 10,000 fits in i64")
}

fn rate_from_stored(raw: i64) -> Decimal {
    Decimal::from(raw) / Decimal::from(RATE_SCALE)
}

fn price_to_stored(price: Decimal) -> i64 {
    // Prices are whole yen.
    price.trunc().to_i64().expect("unit price fits in i64")
}

fn item_from_row(id: &str, name: String, unit_price: i64) -> Result<Item, DbError> {
    let id = parse_id("items.id", id)?;
    Ok(Item::new(id, name, Decimal::from(unit_price))?)
}

fn customer_from_row(id: &str, name: String, code: i64) -> Result<Customer, DbError> {
    let id = parse_id("customers.id", id)?;
    let membership = MembershipType::from_code(code)?;
    Ok(Customer::new(id, name, membership)?)
}
