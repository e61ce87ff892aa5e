//! Month-over-month churn and cohort retention.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::Receipt;
use crate::utils::{month_start, months_between, next_month, ratio};

/// Churn between one month and the month before it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChurnRecord {
    /// First day of the later month
    pub month: NaiveDate,
    /// Lost customers over the previous month's active customers
    pub churn_rate: f64,
    /// Active last month, absent this month
    pub lost_customers: usize,
    /// Active this month
    pub active_customers: usize,
    /// `1 - churn_rate`
    pub retention_rate: f64,
}

/// Named customers active in each calendar month, from the first month with
/// receipts to the last; months without receipts map to an empty set.
#[must_use]
pub fn active_customers_by_month(receipts: &[Receipt]) -> BTreeMap<NaiveDate, HashSet<String>> {
    let mut months: BTreeMap<NaiveDate, HashSet<String>> = BTreeMap::new();
    for receipt in receipts {
        let set = months.entry(month_start(receipt.date())).or_default();
        if let Some(name) = &receipt.customer_name {
            set.insert(name.clone());
        }
    }

    if let (Some(&first), Some(&last)) = (months.keys().next(), months.keys().next_back()) {
        let mut month = first;
        while month < last {
            months.entry(month).or_default();
            month = next_month(month);
        }
    }
    months
}

/// Churn for every pair of consecutive calendar months, oldest first
#[must_use]
pub fn monthly_churn(receipts: &[Receipt]) -> Vec<ChurnRecord> {
    let months: Vec<(NaiveDate, HashSet<String>)> = active_customers_by_month(receipts).into_iter().collect();
    months
        .windows(2)
        .map(|pair| {
            let (_, previous) = &pair[0];
            let (month, current) = &pair[1];
            let lost_customers = previous.difference(current).count();
            let churn_rate = ratio(lost_customers as f64, previous.len() as f64);
            ChurnRecord {
                month: *month,
                churn_rate,
                lost_customers,
                active_customers: current.len(),
                retention_rate: 1.0 - churn_rate,
            }
        })
        .collect()
}

/// Distinct-customer counts per (cohort month, months since cohort)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortMatrix {
    /// First day of each cohort month, oldest first
    pub cohorts: Vec<NaiveDate>,
    /// `counts[i][k]`: customers of cohort `i` active `k` months after joining
    pub counts: Vec<Vec<usize>>,
}

impl CohortMatrix {
    /// Build the matrix from named receipts
    ///
    /// A customer's cohort is the month of their first receipt. Rows are
    /// padded with zeros to the widest cohort index.
    #[must_use]
    pub fn from_receipts(receipts: &[Receipt]) -> Self {
        let mut first_month: HashMap<&str, NaiveDate> = HashMap::new();
        for receipt in receipts {
            let Some(name) = receipt.customer_name.as_deref() else {
                continue;
            };
            let month = month_start(receipt.date());
            first_month
                .entry(name)
                .and_modify(|m| *m = (*m).min(month))
                .or_insert(month);
        }

        let mut cells: BTreeMap<NaiveDate, BTreeMap<usize, HashSet<&str>>> = BTreeMap::new();
        for receipt in receipts {
            let Some(name) = receipt.customer_name.as_deref() else {
                continue;
            };
            let Some(&cohort) = first_month.get(name) else {
                continue;
            };
            let index = usize::try_from(months_between(cohort, receipt.date())).unwrap_or_default();
            cells
                .entry(cohort)
                .or_default()
                .entry(index)
                .or_default()
                .insert(name);
        }

        let width = cells
            .values()
            .filter_map(|row| row.keys().next_back())
            .max()
            .map_or(0, |max| max + 1);

        let mut cohorts = Vec::with_capacity(cells.len());
        let mut counts = Vec::with_capacity(cells.len());
        for (cohort, row) in cells {
            let mut line = vec![0; width];
            for (index, names) in row {
                line[index] = names.len();
            }
            cohorts.push(cohort);
            counts.push(line);
        }
        Self { cohorts, counts }
    }

    /// Month-0 size of each cohort
    #[must_use]
    pub fn cohort_sizes(&self) -> Vec<usize> {
        self.counts
            .iter()
            .map(|row| row.first().copied().unwrap_or_default())
            .collect()
    }

    /// Each cell divided by its cohort's size
    #[must_use]
    pub fn retention_rates(&self) -> Vec<Vec<f64>> {
        self.counts
            .iter()
            .map(|row| {
                let size = row.first().copied().unwrap_or_default() as f64;
                row.iter().map(|n| ratio(*n as f64, size)).collect()
            })
            .collect()
    }

    /// Cohort labels such as `Jan 2025`
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.cohorts
            .iter()
            .map(|c| c.format("%b %Y").to_string())
            .collect()
    }

    /// Number of cohort-index columns
    #[must_use]
    pub fn width(&self) -> usize {
        self.counts.first().map_or(0, Vec::len)
    }
}
