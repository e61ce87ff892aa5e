//! Report rendering for the command line.
//!
//! Rows are rendered as an aligned text table, CSV with a header row, or a
//! pretty-printed JSON array.

use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::Writer;
use serde::Serialize;

use crate::clients::ClientValue;
use crate::error::Result;
use crate::finance::CashFlow;
use crate::models::{Expense, Holiday, Item, OutputFormat, Receipt};
use crate::order::OrderRow;
use crate::retention::{ChurnRecord, CohortMatrix};
use crate::stats::{DailySummary, PeakHour};
use crate::utils::PeriodValue;

/// A row type that can be laid out as a table
pub trait Tabular: Serialize {
    /// Column headers
    fn headers() -> Vec<&'static str>;
    /// Cell text in header order
    fn record(&self) -> Vec<String>;
}

/// An untyped table, used for store dumps and ad-hoc reports
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Column headers
    pub headers: Vec<String>,
    /// Rows of cell text
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Table from typed rows
    pub fn from_rows<T: Tabular>(rows: &[T]) -> Self {
        Self {
            headers: T::headers().into_iter().map(str::to_string).collect(),
            rows: rows.iter().map(Tabular::record).collect(),
        }
    }

    /// Two-column `metric, value` table
    pub fn key_values<K: ToString, V: ToString>(pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            headers: vec!["metric".to_string(), "value".to_string()],
            rows: pairs
                .into_iter()
                .map(|(k, v)| vec![k.to_string(), v.to_string()])
                .collect(),
        }
    }
}

fn money(value: f64) -> String {
    format!("{value:.2}")
}

fn rate(value: f64) -> String {
    format!("{value:.4}")
}

fn opt<T: ToString>(value: Option<&T>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}

/// Write `table` in `format`
pub fn write_table<W: Write>(table: &Table, format: OutputFormat, writer: W) -> Result<()> {
    match format {
        OutputFormat::Txt => write_txt(table, writer),
        OutputFormat::Csv => write_csv(table, writer),
        OutputFormat::Json => {
            let objects: Vec<serde_json::Map<String, serde_json::Value>> = table
                .rows
                .iter()
                .map(|row| {
                    table
                        .headers
                        .iter()
                        .cloned()
                        .zip(row.iter().cloned().map(serde_json::Value::String))
                        .collect()
                })
                .collect();
            write_json(&objects, writer)
        }
    }
}

/// Write typed rows in `format`; JSON keeps native field types
pub fn write_rows<T: Tabular, W: Write>(rows: &[T], format: OutputFormat, writer: W) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(rows, writer),
        _ => write_table(&Table::from_rows(rows), format, writer),
    }
}

/// Write typed rows to `path`, creating its parent directory
pub fn write_rows_to_file<T: Tabular>(rows: &[T], format: OutputFormat, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    write_rows(rows, format, BufWriter::new(file))
}

/// Aligned plain-text table: header, dashed rule, left-aligned cells
fn write_txt<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    writeln!(writer, "{}", line(&table.headers))?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(writer, "{}", line(&rule))?;
    for row in &table.rows {
        writeln!(writer, "{}", line(row))?;
    }

    writer.flush()?;
    Ok(())
}

fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut writer = Writer::from_writer(writer);
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json<T: Serialize + ?Sized, W: Write>(value: &T, writer: W) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Cohort matrix as a table, counts or retention rates
#[must_use]
pub fn cohort_table(matrix: &CohortMatrix, as_rates: bool) -> Table {
    let mut headers = vec!["cohort".to_string(), "size".to_string()];
    headers.extend((0..matrix.width()).map(|k| k.to_string()));

    let rates = matrix.retention_rates();
    let rows = matrix
        .labels()
        .into_iter()
        .zip(matrix.cohort_sizes())
        .enumerate()
        .map(|(i, (label, size))| {
            let mut row = vec![label, size.to_string()];
            if as_rates {
                row.extend(rates[i].iter().map(|r| format!("{r:.3}")));
            } else {
                row.extend(matrix.counts[i].iter().map(ToString::to_string));
            }
            row
        })
        .collect();

    Table { headers, rows }
}

impl Tabular for DailySummary {
    fn headers() -> Vec<&'static str> {
        vec![
            "date",
            "total_gross",
            "unique_customers",
            "full_loads",
            "titan_runs",
            "titan_usage",
            "hours_with_customer",
            "n_detergent",
            "n_fabcon",
            "n_bleach",
            "receipts",
        ]
    }

    fn record(&self) -> Vec<String> {
        vec![
            self.date.to_string(),
            money(self.total_gross),
            self.unique_customers.to_string(),
            self.full_loads.to_string(),
            self.titan_runs.to_string(),
            self.titan_usage.map(|u| format!("{u:.3}")).unwrap_or_default(),
            format!("{:.2}", self.hours_with_customer),
            self.n_detergent.to_string(),
            self.n_fabcon.to_string(),
            self.n_bleach.to_string(),
            self.receipts.len().to_string(),
        ]
    }
}

impl Tabular for PeakHour {
    fn headers() -> Vec<&'static str> {
        vec!["weekday", "hour", "load_count"]
    }

    fn record(&self) -> Vec<String> {
        vec![
            self.weekday.to_string(),
            self.hour.to_string(),
            self.load_count.to_string(),
        ]
    }
}

impl Tabular for PeriodValue {
    fn headers() -> Vec<&'static str> {
        vec!["period", "value"]
    }

    fn record(&self) -> Vec<String> {
        vec![self.period.to_string(), money(self.value)]
    }
}

impl Tabular for ChurnRecord {
    fn headers() -> Vec<&'static str> {
        vec![
            "month",
            "churn_rate",
            "retention_rate",
            "lost_customers",
            "active_customers",
        ]
    }

    fn record(&self) -> Vec<String> {
        vec![
            self.month.format("%Y-%m").to_string(),
            rate(self.churn_rate),
            rate(self.retention_rate),
            self.lost_customers.to_string(),
            self.active_customers.to_string(),
        ]
    }
}

impl Tabular for ClientValue {
    fn headers() -> Vec<&'static str> {
        vec![
            "customer_id",
            "customer_name",
            "phone",
            "address",
            "total_loads",
            "n_transactions",
            "last_visit",
            "tenure_days",
            "total_spent",
            "total_discount",
            "lifetime_value",
            "visits",
            "loads_until_promo",
        ]
    }

    fn record(&self) -> Vec<String> {
        vec![
            self.customer_id.clone(),
            self.customer_name.clone(),
            opt(self.phone.as_ref()),
            opt(self.address.as_ref()),
            self.total_loads.to_string(),
            self.n_transactions.to_string(),
            self.last_visit.format("%Y-%m-%d %H:%M").to_string(),
            self.tenure_days.to_string(),
            money(self.total_spent),
            money(self.total_discount),
            money(self.lifetime_value),
            self.visits.len().to_string(),
            self.loads_until_promo.to_string(),
        ]
    }
}

impl Tabular for CashFlow {
    fn headers() -> Vec<&'static str> {
        vec!["month", "revenue", "expense", "net", "net_pct", "days_open"]
    }

    fn record(&self) -> Vec<String> {
        vec![
            self.month.format("%B %Y").to_string(),
            money(self.revenue),
            money(-self.expense),
            money(self.net),
            self.net_pct.map(rate).unwrap_or_default(),
            self.daily_revenue.len().to_string(),
        ]
    }
}

impl Tabular for Receipt {
    fn headers() -> Vec<&'static str> {
        vec![
            "timestamp",
            "receipt_id",
            "gross_sales",
            "discounts",
            "total_collected",
            "customer_name",
            "description",
            "payment_type",
            "cashier_name",
        ]
    }

    fn record(&self) -> Vec<String> {
        vec![
            self.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            self.receipt_id.clone(),
            money(self.gross_sales),
            money(self.discounts),
            money(self.total_collected),
            opt(self.customer_name.as_ref()),
            self.description.clone(),
            opt(self.payment_type.as_ref()),
            self.cashier_name.clone(),
        ]
    }
}

impl Tabular for Expense {
    fn headers() -> Vec<&'static str> {
        vec![
            "date",
            "item",
            "note",
            "category",
            "subcategory",
            "quantity",
            "unit_cost",
            "total_cost",
        ]
    }

    fn record(&self) -> Vec<String> {
        vec![
            opt(self.date.as_ref()),
            opt(self.item_name.as_ref()),
            opt(self.note.as_ref()),
            opt(self.category.as_ref()),
            opt(self.subcategory.as_ref()),
            self.quantity.to_string(),
            money(self.unit_cost),
            money(self.total_cost),
        ]
    }
}

impl Tabular for Holiday {
    fn headers() -> Vec<&'static str> {
        vec!["date", "description"]
    }

    fn record(&self) -> Vec<String> {
        vec![self.date.to_string(), self.description.clone()]
    }
}

impl Tabular for Item {
    fn headers() -> Vec<&'static str> {
        vec!["name", "category", "cost"]
    }

    fn record(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.category.as_str().to_string(),
            money(self.cost),
        ]
    }
}

impl Tabular for OrderRow {
    fn headers() -> Vec<&'static str> {
        vec!["customer", "created_at", "items", "total"]
    }

    fn record(&self) -> Vec<String> {
        vec![
            self.customer.clone(),
            self.created_at.format("%Y-%m-%d %H:%M").to_string(),
            self.items.join("; "),
            money(self.total),
        ]
    }
}
