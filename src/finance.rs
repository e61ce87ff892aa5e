//! Expense totals and monthly cash flow.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Customer, Expense, Receipt};
use crate::utils::{aggregate_by_period, month_start, Aggregation, Period, PeriodValue};

/// Label for expenses without a category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Revenue against expense for one month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CashFlow {
    /// First day of the month
    pub month: NaiveDate,
    /// Gross sales
    pub revenue: f64,
    /// Total expense cost
    pub expense: f64,
    /// `revenue - expense`
    pub net: f64,
    /// `net / expense`; `None` when nothing was spent
    pub net_pct: Option<f64>,
    /// Gross sales of each day of the month that had receipts, in date order
    pub daily_revenue: Vec<f64>,
}

/// Headline counters for the shop
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overview {
    /// Days since opening
    pub operating_days: i64,
    /// Rows in the customer table
    pub unique_clients: usize,
    /// Receipts on record
    pub transactions: usize,
}

/// Sum of all expense costs
#[must_use]
pub fn total_expense(expenses: &[Expense]) -> f64 {
    expenses.iter().map(|e| e.total_cost).sum()
}

/// Month of the latest dated expense and the cost spent from its first day on
#[must_use]
pub fn latest_month_expense(expenses: &[Expense]) -> Option<(NaiveDate, f64)> {
    let latest = expenses.iter().filter_map(|e| e.date).max().map(month_start)?;
    let total = expenses
        .iter()
        .filter(|e| e.date.is_some_and(|d| d >= latest))
        .map(|e| e.total_cost)
        .sum();
    Some((latest, total))
}

/// Cost per category, sorted by category name
#[must_use]
pub fn expense_by_category(expenses: &[Expense]) -> Vec<(String, f64)> {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for expense in expenses {
        let category = expense.category.as_deref().unwrap_or(UNCATEGORIZED);
        *totals.entry(category).or_default() += expense.total_cost;
    }
    totals.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

/// Expense totals per month, oldest first; undated rows are left out
#[must_use]
pub fn monthly_expense(expenses: &[Expense], aggregation: Aggregation) -> Vec<PeriodValue> {
    aggregate_by_period(expenses, Period::Month, aggregation, |e| e.date, |e| e.total_cost)
}

/// Monthly cash flow for months that have both receipts and dated expenses
///
/// Months missing on either side are dropped. Rows are oldest first.
#[must_use]
pub fn monthly_cash_flow(receipts: &[Receipt], expenses: &[Expense]) -> Vec<CashFlow> {
    let revenue: BTreeMap<NaiveDate, f64> = aggregate_by_period(
        receipts,
        Period::Month,
        Aggregation::Sum,
        |r| Some(r.date()),
        |r| r.gross_sales,
    )
    .into_iter()
    .map(|p| (p.period, p.value))
    .collect();
    let expense: BTreeMap<NaiveDate, f64> = monthly_expense(expenses, Aggregation::Sum)
        .into_iter()
        .map(|p| (p.period, p.value))
        .collect();

    let mut daily: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for day in aggregate_by_period(
        receipts,
        Period::Day,
        Aggregation::Sum,
        |r| Some(r.date()),
        |r| r.gross_sales,
    ) {
        daily.entry(month_start(day.period)).or_default().push(day.value);
    }

    revenue
        .into_iter()
        .filter_map(|(month, revenue)| {
            let expense = *expense.get(&month)?;
            let net = revenue - expense;
            Some(CashFlow {
                month,
                revenue,
                expense,
                net,
                net_pct: (expense != 0.0).then(|| net / expense),
                daily_revenue: daily.remove(&month).unwrap_or_default(),
            })
        })
        .collect()
}

/// Overview counters as of `today`
#[must_use]
pub fn overview(customers: &[Customer], receipts: &[Receipt], opened_on: NaiveDate, today: NaiveDate) -> Overview {
    Overview {
        operating_days: (today - opened_on).num_days(),
        unique_clients: customers.len(),
        transactions: receipts.len(),
    }
}
