use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row, Statement};
use tracing::{debug, info};

use crate::error::{CleannestError, Result};
use crate::models::{Customer, Expense, Item, ItemCategory, ItemCounts, PaymentType, Receipt};
use crate::schema::{self, customers, expenses, items, receipts};

impl ToSql for PaymentType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PaymentType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: CleannestError| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for ItemCategory {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ItemCategory {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: CleannestError| FromSqlError::Other(Box::new(e)))
    }
}

/// The analytical store: one SQLite file holding the four shop tables
///
/// Every write replaces a whole table; there are no incremental updates.
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) the store at `path`, creating its parent directory
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "Opened store");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Private in-memory store, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
        })
    }

    /// Backing file, `None` for an in-memory store
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Drop, recreate and fill `table` inside one transaction
    ///
    /// Readers never observe a half-written table: either the old contents or
    /// the new ones are visible.
    fn replace_table<T>(
        &mut self,
        table: &str,
        ddl: &str,
        insert: &str,
        rows: &[T],
        bind: impl Fn(&mut Statement<'_>, &T) -> rusqlite::Result<usize>,
    ) -> Result<usize> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {table}"))?;
        tx.execute_batch(ddl)?;
        {
            let mut stmt = tx.prepare(insert)?;
            for row in rows {
                bind(&mut stmt, row)?;
            }
        }
        tx.commit()?;
        info!(table, rows = rows.len(), "Replaced table");
        Ok(rows.len())
    }

    /// Replace the customers table
    pub fn replace_customers(&mut self, rows: &[Customer]) -> Result<usize> {
        self.replace_table(customers::TABLE, customers::DDL, customers::INSERT, rows, |stmt, c| {
            stmt.execute(params![
                c.customer_id,
                c.customer_name,
                c.email,
                c.phone,
                c.address,
                c.city,
                c.province,
                c.postal_code,
                c.country,
                c.customer_code,
                c.points_balance,
                c.note,
                c.first_visit,
                c.last_visit,
                c.total_visits,
                c.total_spent,
            ])
        })
    }

    /// Replace the receipts table; rows are stored in the given order
    pub fn replace_receipts(&mut self, rows: &[Receipt]) -> Result<usize> {
        self.replace_table(receipts::TABLE, receipts::DDL, receipts::INSERT, rows, |stmt, r| {
            stmt.execute(params![
                r.timestamp,
                r.receipt_id,
                r.receipt_type,
                r.gross_sales,
                r.discounts,
                r.total_collected,
                r.payment_type,
                r.description,
                r.cashier_name,
                r.customer_name,
                r.status,
                r.items.wash,
                r.items.dry,
                r.items.fold,
                r.items.detergent,
                r.items.fabcon,
                r.items.bleach,
                r.is_titan,
                r.is_full_load,
                r.has_extra,
            ])
        })
    }

    /// Replace the expenses table
    pub fn replace_expenses(&mut self, rows: &[Expense]) -> Result<usize> {
        self.replace_table(expenses::TABLE, expenses::DDL, expenses::INSERT, rows, |stmt, e| {
            stmt.execute(params![
                e.date,
                e.item_name,
                e.note,
                e.category,
                e.subcategory,
                e.quantity,
                e.unit_cost,
                e.total_cost,
            ])
        })
    }

    /// Replace the item catalog
    pub fn replace_items(&mut self, rows: &[Item]) -> Result<usize> {
        self.replace_table(items::TABLE, items::DDL, items::INSERT, rows, |stmt, i| {
            stmt.execute(params![
                i.name,
                i.category,
                i.cost,
                i.created_at,
                i.updated_at,
                i.deleted_at,
            ])
        })
    }

    fn map_customer(row: &Row) -> rusqlite::Result<Customer> {
        Ok(Customer {
            customer_id: row.get("customer_id")?,
            customer_name: row.get("customer_name")?,
            email: row.get("email")?,
            phone: row.get("phone")?,
            address: row.get("address")?,
            city: row.get("city")?,
            province: row.get("province")?,
            postal_code: row.get("postal_code")?,
            country: row.get("country")?,
            customer_code: row.get("customer_code")?,
            points_balance: row.get("points_balance")?,
            note: row.get("note")?,
            first_visit: row.get("first_visit")?,
            last_visit: row.get("last_visit")?,
            total_visits: row.get("total_visits")?,
            total_spent: row.get("total_spent")?,
        })
    }

    fn map_receipt(row: &Row) -> rusqlite::Result<Receipt> {
        Ok(Receipt {
            timestamp: row.get("timestamp")?,
            receipt_id: row.get("receipt_id")?,
            receipt_type: row.get("receipt_type")?,
            gross_sales: row.get("gross_sales")?,
            discounts: row.get("discounts")?,
            total_collected: row.get("total_collected")?,
            payment_type: row.get("payment_type")?,
            description: row.get("description")?,
            cashier_name: row.get("cashier_name")?,
            customer_name: row.get("customer_name")?,
            status: row.get("status")?,
            items: ItemCounts {
                wash: row.get("n_wash")?,
                dry: row.get("n_dry")?,
                fold: row.get("n_fold")?,
                detergent: row.get("n_detergent")?,
                fabcon: row.get("n_fabcon")?,
                bleach: row.get("n_bleach")?,
            },
            is_titan: row.get("is_titan")?,
            is_full_load: row.get("is_full_load")?,
            has_extra: row.get("has_extra")?,
        })
    }

    fn map_expense(row: &Row) -> rusqlite::Result<Expense> {
        Ok(Expense {
            date: row.get("date")?,
            item_name: row.get("item_name")?,
            note: row.get("note")?,
            category: row.get("category")?,
            subcategory: row.get("subcategory")?,
            quantity: row.get("quantity")?,
            unit_cost: row.get("unit_cost")?,
            total_cost: row.get("total_cost")?,
        })
    }

    fn map_item(row: &Row) -> rusqlite::Result<Item> {
        Ok(Item {
            name: row.get("name")?,
            category: row.get("category")?,
            cost: row.get("cost")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            deleted_at: row.get("deleted_at")?,
        })
    }

    fn fetch<T>(&self, sql: &str, map: fn(&Row) -> rusqlite::Result<T>) -> Result<Vec<T>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], map)?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// All customers in stored order
    pub fn fetch_customers(&self) -> Result<Vec<Customer>> {
        self.fetch(&format!("SELECT * FROM {} ORDER BY rowid", customers::TABLE), Self::map_customer)
    }

    /// All receipts in stored order (newest first after ingestion)
    pub fn fetch_receipts(&self) -> Result<Vec<Receipt>> {
        self.fetch(&format!("SELECT * FROM {} ORDER BY rowid", receipts::TABLE), Self::map_receipt)
    }

    /// Expenses that name an item; rows without one are placeholders
    pub fn fetch_expenses(&self) -> Result<Vec<Expense>> {
        self.fetch(
            &format!(
                "SELECT * FROM {} WHERE {} IS NOT NULL ORDER BY rowid",
                expenses::TABLE,
                expenses::ITEM_NAME
            ),
            Self::map_expense,
        )
    }

    /// The item catalog, including soft-deleted items
    pub fn fetch_items(&self) -> Result<Vec<Item>> {
        self.fetch(&format!("SELECT * FROM {} ORDER BY id", items::TABLE), Self::map_item)
    }

    /// First customer with exactly this name
    pub fn find_customer_by_name(&self, name: &str) -> Result<Option<Customer>> {
        let customer = self
            .conn
            .query_row(
                &format!(
                    "SELECT * FROM {} WHERE {} = ?1 LIMIT 1",
                    customers::TABLE,
                    customers::CUSTOMER_NAME
                ),
                params![name],
                Self::map_customer,
            )
            .optional()?;
        Ok(customer)
    }

    /// Names of all user tables in the store
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut results = Vec::new();
        for name in names {
            results.push(name?);
        }
        Ok(results)
    }

    /// Every row of `table` rendered as text, with the column names
    ///
    /// Only tables this crate manages can be dumped.
    pub fn dump_table(&self, table: &str) -> Result<(Vec<String>, Vec<Vec<String>>)> {
        if !schema::ALL_TABLES.contains(&table) {
            return Err(CleannestError::NotFound(format!("table {table:?}")));
        }
        if !self.has_table(table)? {
            return Err(CleannestError::NotFound(format!("table {table:?} has not been loaded")));
        }

        let mut stmt = self.conn.prepare(&format!("SELECT * FROM {table} ORDER BY rowid"))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
        let width = columns.len();
        let rows = stmt.query_map([], |row| {
            (0..width)
                .map(|i| row.get_ref(i).map(render_value))
                .collect::<rusqlite::Result<Vec<_>>>()
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok((columns, results))
    }

    /// Whether `table` exists in the store
    pub fn has_table(&self, table: &str) -> Result<bool> {
        Ok(self.table_names()?.iter().any(|t| t == table))
    }

    /// Row counts of every managed table present in the store
    pub fn table_counts(&self) -> Result<Vec<(String, usize)>> {
        let mut counts = Vec::new();
        for table in self.table_names()? {
            if schema::ALL_TABLES.contains(&table.as_str()) {
                let n = self.count(&table)?;
                counts.push((table, n));
            }
        }
        Ok(counts)
    }

    /// Row count of a managed table, 0 when it has not been created
    pub fn count(&self, table: &str) -> Result<usize> {
        if !schema::ALL_TABLES.contains(&table) {
            return Err(CleannestError::NotFound(format!("table {table:?}")));
        }
        if !self.has_table(table)? {
            return Ok(0);
        }
        let n: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or_default())
    }
}

fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
    }
}
