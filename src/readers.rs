//! Raw source readers for point-of-sale CSV exports.
//!
//! Readers return text-only records; typing, feature extraction and
//! deduplication happen downstream. Directory readers visit `*.csv` files in
//! file-name order so repeated runs see rows in the same order.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info};

use crate::error::{CleannestError, Result};
use crate::models::{Holiday, RawCustomer, RawReceipt};

/// Number of positional columns in a customer export
pub const CUSTOMER_COLUMNS: usize = 16;

/// Receipt export headers, in canonical field order
pub const RECEIPT_HEADERS: [&str; 11] = [
    "Date",
    "Receipt number",
    "Receipt type",
    "Gross sales",
    "Discounts",
    "Total collected",
    "Payment type",
    "Description",
    "Cashier name",
    "Customer name",
    "Status",
];

/// List the CSV files in `dir`, sorted by file name
///
/// A missing directory or one without CSV files is an error: ingestion must
/// not replace a table with nothing.
pub fn csv_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(CleannestError::MissingSource(format!(
            "directory {} does not exist",
            dir.display()
        )));
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(CleannestError::MissingSource(format!(
            "no CSV files in {}",
            dir.display()
        )));
    }
    Ok(files)
}

/// Read customers from any CSV source, mapping the 16 columns by position
pub fn read_customers<R: Read>(reader: R, source_name: &str) -> Result<Vec<RawCustomer>> {
    let mut csv = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv.records() {
        let record = record?;
        if record.len() < CUSTOMER_COLUMNS {
            return Err(CleannestError::MissingColumn {
                column: format!("column {} of {CUSTOMER_COLUMNS}", record.len() + 1),
                source_name: source_name.to_string(),
            });
        }
        let cell = |i: usize| record.get(i).unwrap_or_default().trim().to_string();
        rows.push(RawCustomer {
            customer_id: cell(0),
            customer_name: cell(1),
            email: cell(2),
            phone: cell(3),
            address: cell(4),
            city: cell(5),
            province: cell(6),
            postal_code: cell(7),
            country: cell(8),
            customer_code: cell(9),
            points_balance: cell(10),
            note: cell(11),
            first_visit: cell(12),
            last_visit: cell(13),
            total_visits: cell(14),
            total_spent: cell(15),
        });
    }

    debug!(source = source_name, rows = rows.len(), "Read customer export");
    Ok(rows)
}

/// Read receipts from any CSV source, selecting the 11 known columns by header
///
/// Extra columns in the export are ignored; a missing one is an error.
pub fn read_receipts<R: Read>(reader: R, source_name: &str) -> Result<Vec<RawReceipt>> {
    let mut csv = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = csv.headers()?.clone();
    let mut positions = [0usize; RECEIPT_HEADERS.len()];
    for (slot, wanted) in positions.iter_mut().zip(RECEIPT_HEADERS) {
        *slot = headers
            .iter()
            .position(|h| h.trim() == wanted)
            .ok_or_else(|| CleannestError::MissingColumn {
                column: wanted.to_string(),
                source_name: source_name.to_string(),
            })?;
    }

    let mut rows = Vec::new();
    for record in csv.records() {
        let record = record?;
        rows.push(receipt_from_record(&record, &positions));
    }

    debug!(source = source_name, rows = rows.len(), "Read receipt export");
    Ok(rows)
}

fn receipt_from_record(record: &StringRecord, positions: &[usize; 11]) -> RawReceipt {
    let cell = |i: usize| record.get(positions[i]).unwrap_or_default().trim().to_string();
    RawReceipt {
        timestamp: cell(0),
        receipt_id: cell(1),
        receipt_type: cell(2),
        gross_sales: cell(3),
        discounts: cell(4),
        total_collected: cell(5),
        payment_type: cell(6),
        description: cell(7),
        cashier_name: cell(8),
        customer_name: cell(9),
        status: cell(10),
    }
}

/// Read and concatenate every customer export in `dir`
pub fn read_customer_dir(dir: &Path) -> Result<Vec<RawCustomer>> {
    let mut all = Vec::new();
    for path in csv_files_in(dir)? {
        let file = fs::File::open(&path)?;
        all.extend(read_customers(file, &path.display().to_string())?);
    }
    info!(dir = %dir.display(), rows = all.len(), "Loaded customer exports");
    Ok(all)
}

/// Read and concatenate every receipt export in `dir`
pub fn read_receipt_dir(dir: &Path) -> Result<Vec<RawReceipt>> {
    let mut all = Vec::new();
    for path in csv_files_in(dir)? {
        let file = fs::File::open(&path)?;
        all.extend(read_receipts(file, &path.display().to_string())?);
    }
    info!(dir = %dir.display(), rows = all.len(), "Loaded receipt exports");
    Ok(all)
}

/// Load `<dir>/<year>.csv` with `date, description` columns
pub fn load_holidays(dir: &Path, year: i32) -> Result<Vec<Holiday>> {
    let path = dir.join(format!("{year}.csv"));
    if !path.is_file() {
        return Err(CleannestError::MissingSource(format!(
            "holiday file {} does not exist",
            path.display()
        )));
    }

    let mut csv = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(&path)?;

    let mut holidays = Vec::new();
    for record in csv.records() {
        let record = record?;
        let raw_date = record.get(0).unwrap_or_default().trim();
        if raw_date.is_empty() {
            continue;
        }
        let date = crate::utils::parse_flexible_date(raw_date)
            .ok_or_else(|| CleannestError::InvalidDate(raw_date.to_string()))?;
        holidays.push(Holiday {
            date,
            description: record.get(1).unwrap_or_default().trim().to_string(),
        });
    }
    holidays.sort_by_key(|h: &Holiday| h.date);
    Ok(holidays)
}

/// Whether `date` is one of `holidays`
#[must_use]
pub fn is_holiday(holidays: &[Holiday], date: NaiveDate) -> bool {
    holidays.iter().any(|h| h.date == date)
}
