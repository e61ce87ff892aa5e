//! Table normalization: deduplication and type coercion.
//!
//! Duplicates are resolved last-write-wins in ingestion order; the surviving
//! row keeps the position of the first occurrence so the output order does
//! not depend on how many duplicates there were.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::{CleannestError, Result};
use crate::models::{Customer, Expense, RawCustomer, RawExpense, Receipt};
use crate::utils::{non_empty, parse_amount, parse_flexible_date, to_title_case};

/// Date layout of the expense sheets
pub const EXPENSE_DATE_FORMAT: &str = "%m/%d/%Y";

/// Deduplicate by key; later rows overwrite earlier ones in place
///
/// Returns the surviving rows and the number of duplicates removed.
pub fn dedup_last_wins<T, K, F>(rows: Vec<T>, key: F) -> (Vec<T>, usize)
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let total = rows.len();
    let mut index: HashMap<K, usize> = HashMap::with_capacity(total);
    let mut out: Vec<T> = Vec::with_capacity(total);
    for row in rows {
        let k = key(&row);
        if let Some(&pos) = index.get(&k) {
            out[pos] = row;
        } else {
            index.insert(k, out.len());
            out.push(row);
        }
    }
    let removed = total - out.len();
    (out, removed)
}

/// Coerce one raw customer row
///
/// Numeric and date columns are lenient: blanks and garbage become defaults,
/// since only the identity and contact columns feed the analytics.
#[must_use]
pub fn normalize_customer(raw: RawCustomer) -> Customer {
    let customer_id = raw.customer_id.trim().to_string();
    let lenient_date = |field: &str, text: &str| -> Option<NaiveDate> {
        let parsed = parse_flexible_date(text);
        if parsed.is_none() && !text.trim().is_empty() {
            warn!(customer_id = %customer_id, field, value = text, "Unreadable visit date");
        }
        parsed
    };

    let first_visit = lenient_date("first_visit", &raw.first_visit);
    let last_visit = lenient_date("last_visit", &raw.last_visit);
    let total_visits = parse_amount(&raw.total_visits).map_or(0, |v| v.max(0.0).round() as u32);

    Customer {
        customer_name: to_title_case(raw.customer_name.trim()),
        email: non_empty(&raw.email),
        phone: non_empty(&raw.phone),
        address: non_empty(&raw.address),
        city: non_empty(&raw.city),
        province: non_empty(&raw.province),
        postal_code: non_empty(&raw.postal_code),
        country: non_empty(&raw.country),
        customer_code: non_empty(&raw.customer_code),
        points_balance: parse_amount(&raw.points_balance).unwrap_or(0.0),
        note: non_empty(&raw.note),
        first_visit,
        last_visit,
        total_visits,
        total_spent: parse_amount(&raw.total_spent).unwrap_or(0.0),
        customer_id,
    }
}

/// Normalize and deduplicate customers by `customer_id`
#[must_use]
pub fn normalize_customers(raws: Vec<RawCustomer>) -> (Vec<Customer>, usize) {
    let customers: Vec<Customer> = raws
        .into_iter()
        .filter(|raw| !raw.customer_id.trim().is_empty())
        .map(normalize_customer)
        .collect();
    let (customers, removed) = dedup_last_wins(customers, |c| c.customer_id.clone());
    debug!(rows = customers.len(), duplicates = removed, "Normalized customers");
    (customers, removed)
}

/// Deduplicate receipts by `receipt_id` and sort newest first
///
/// Ties on timestamp are broken by receipt id so the order is reproducible.
#[must_use]
pub fn normalize_receipts(receipts: Vec<Receipt>) -> (Vec<Receipt>, usize) {
    let (mut receipts, removed) = dedup_last_wins(receipts, |r| r.receipt_id.clone());
    receipts.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.receipt_id.cmp(&b.receipt_id))
    });
    debug!(rows = receipts.len(), duplicates = removed, "Normalized receipts");
    (receipts, removed)
}

/// Coerce one expense row, applying defaults for missing quantities and costs
pub fn normalize_expense(raw: RawExpense) -> Result<Expense> {
    let date = if raw.date.is_empty() {
        None
    } else {
        Some(
            NaiveDate::parse_from_str(&raw.date, EXPENSE_DATE_FORMAT)
                .map_err(|e| CleannestError::InvalidDate(format!("expense date {:?}: {e}", raw.date)))?,
        )
    };

    let quantity = parse_amount(&raw.quantity).map_or(1, |q| q.round() as i64);

    Ok(Expense {
        date,
        item_name: non_empty(&raw.item),
        note: non_empty(&raw.note),
        category: non_empty(&raw.category),
        subcategory: non_empty(&raw.subcategory),
        quantity,
        unit_cost: parse_amount(&raw.unit).unwrap_or(0.0),
        total_cost: parse_amount(&raw.total_cost).unwrap_or(0.0),
    })
}

/// Normalize expense rows, skipping rows with no content at all
pub fn normalize_expenses(raws: Vec<RawExpense>) -> Result<Vec<Expense>> {
    raws.into_iter()
        .filter(|raw| !raw.is_blank())
        .map(normalize_expense)
        .collect()
}
