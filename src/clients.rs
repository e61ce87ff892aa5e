//! Per-client lifetime value.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::{Customer, Receipt};

/// Loads between free-load promos when no other value is configured
pub const PROMO_EVERY_LOADS: u32 = 10;

/// One client's spending history joined with their contact details
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientValue {
    /// Customer id from the customer table
    pub customer_id: String,
    /// Customer name, the join key
    pub customer_name: String,
    /// Contact number
    pub phone: Option<String>,
    /// Street address
    pub address: Option<String>,
    /// Sum of gross sales
    pub total_spent: f64,
    /// Mean gross sales per receipt
    pub mean_transaction_value: f64,
    /// Sum of discounts
    pub total_discount: f64,
    /// Sum of folds
    pub total_loads: u32,
    /// Number of receipts
    pub n_transactions: usize,
    /// Earliest receipt
    pub first_visit: NaiveDateTime,
    /// Latest receipt
    pub last_visit: NaiveDateTime,
    /// Distinct visit days as `YYYY-MM-DD`, ascending
    pub visits: Vec<String>,
    /// Whole days between first and last visit
    pub tenure_days: i64,
    /// `total_spent - total_discount`
    pub lifetime_value: f64,
    /// Loads left before the next promo; a full cycle right after a promo
    pub loads_until_promo: u32,
}

#[derive(Default)]
struct Accumulator {
    total_spent: f64,
    total_discount: f64,
    total_loads: u32,
    n_transactions: usize,
    first_visit: Option<NaiveDateTime>,
    last_visit: Option<NaiveDateTime>,
    visits: BTreeSet<String>,
}

/// Lifetime value for every named client that also appears in `customers`
///
/// Receipt names with no matching customer row are dropped, as are walk-ins.
/// The result is sorted by name.
#[must_use]
pub fn client_values(customers: &[Customer], receipts: &[Receipt], promo_every: u32) -> Vec<ClientValue> {
    let promo_every = promo_every.max(1);
    let mut by_name: BTreeMap<&str, Accumulator> = BTreeMap::new();
    for receipt in receipts {
        let Some(name) = receipt.customer_name.as_deref() else {
            continue;
        };
        let acc = by_name.entry(name).or_default();
        acc.total_spent += receipt.gross_sales;
        acc.total_discount += receipt.discounts;
        acc.total_loads += receipt.items.fold;
        acc.n_transactions += 1;
        acc.first_visit = Some(acc.first_visit.map_or(receipt.timestamp, |t| t.min(receipt.timestamp)));
        acc.last_visit = Some(acc.last_visit.map_or(receipt.timestamp, |t| t.max(receipt.timestamp)));
        acc.visits.insert(receipt.timestamp.format("%Y-%m-%d").to_string());
    }

    let mut contacts: HashMap<&str, Vec<&Customer>> = HashMap::new();
    for customer in customers {
        contacts.entry(customer.customer_name.as_str()).or_default().push(customer);
    }

    let mut out = Vec::new();
    for (name, acc) in by_name {
        let (Some(first_visit), Some(last_visit)) = (acc.first_visit, acc.last_visit) else {
            continue;
        };
        let Some(matches) = contacts.get(name) else {
            continue;
        };
        for customer in matches {
            out.push(ClientValue {
                customer_id: customer.customer_id.clone(),
                customer_name: name.to_string(),
                phone: customer.phone.clone(),
                address: customer.address.clone(),
                total_spent: acc.total_spent,
                mean_transaction_value: acc.total_spent / acc.n_transactions as f64,
                total_discount: acc.total_discount,
                total_loads: acc.total_loads,
                n_transactions: acc.n_transactions,
                first_visit,
                last_visit,
                visits: acc.visits.iter().cloned().collect(),
                tenure_days: (last_visit - first_visit).num_days(),
                lifetime_value: acc.total_spent - acc.total_discount,
                loads_until_promo: promo_every - acc.total_loads % promo_every,
            });
        }
    }
    out
}
