//! Revenue, load and customer statistics over receipt snapshots.
//!
//! Everything here is a pure function of the slices handed in. Receipts
//! without a customer name (walk-ins) count towards revenue and loads but are
//! ignored by every customer-level figure.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::{Datelike, NaiveDate, Timelike};
use serde::Serialize;

use crate::models::{Customer, DateRange, Receipt};
use crate::utils::{aggregate_by_period, mean, ratio, Aggregation, Period, PeriodValue};

/// Default gross-sales threshold for a receipt to count as a real visit
pub const RETURNING_MIN_GROSS: f64 = 100.0;

/// Per-receipt quantity that time series can be built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Gross sales
    Revenue,
    /// Fold count, the shop's load measure
    Loads,
    /// Receipts that were a full load
    FullLoads,
    /// Discounts given
    Discounts,
    /// Amount collected
    Collected,
}

impl Metric {
    /// Value of this metric for one receipt
    #[must_use]
    pub fn of(self, receipt: &Receipt) -> f64 {
        match self {
            Self::Revenue => receipt.gross_sales,
            Self::Loads => f64::from(receipt.items.fold),
            Self::FullLoads => f64::from(u8::from(receipt.is_full_load)),
            Self::Discounts => receipt.discounts,
            Self::Collected => receipt.total_collected,
        }
    }
}

/// One row of the daily summary table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySummary {
    /// Calendar day
    pub date: NaiveDate,
    /// Gross sales for the day
    pub total_gross: f64,
    /// Distinct named customers
    pub unique_customers: usize,
    /// Their names, sorted
    pub customers: Vec<String>,
    /// Full-load receipts
    pub full_loads: u32,
    /// Receipts that used a TITAN machine
    pub titan_runs: u32,
    /// `titan_runs / full_loads` rounded to 3 places; `None` with no full loads
    pub titan_usage: Option<f64>,
    /// Hours between the first and last receipt of the day
    pub hours_with_customer: f64,
    /// Detergent sachets sold
    pub n_detergent: u32,
    /// Fabric conditioner sachets sold
    pub n_fabcon: u32,
    /// Bleach sachets sold
    pub n_bleach: u32,
    /// Receipt ids in input order
    pub receipts: Vec<String>,
}

/// Load count for one weekday and hour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeakHour {
    /// ISO weekday, Monday = 1
    pub weekday: u32,
    /// Hour of day, 0-23
    pub hour: u32,
    /// Folds rung up in that slot
    pub load_count: u64,
}

/// Headline numbers computed over one snapshot of customers and receipts
pub struct Stats<'a> {
    customers: &'a [Customer],
    receipts: &'a [Receipt],
    returning_min_gross: f64,
}

impl<'a> Stats<'a> {
    /// Statistics over the given snapshot
    #[must_use]
    pub const fn new(customers: &'a [Customer], receipts: &'a [Receipt]) -> Self {
        Self {
            customers,
            receipts,
            returning_min_gross: RETURNING_MIN_GROSS,
        }
    }

    /// Override the returning-customer threshold
    #[must_use]
    pub const fn with_returning_min_gross(mut self, threshold: f64) -> Self {
        self.returning_min_gross = threshold;
        self
    }

    /// Date of the most recent receipt
    #[must_use]
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.receipts.iter().map(Receipt::date).max()
    }

    fn daily(&self, metric: Metric) -> Vec<PeriodValue> {
        aggregate_by_period(
            self.receipts,
            Period::Day,
            Aggregation::Sum,
            |r| Some(r.date()),
            |r| metric.of(r),
        )
    }

    fn on_latest_day(&self, metric: Metric) -> f64 {
        let Some(latest) = self.latest_date() else {
            return 0.0;
        };
        self.receipts
            .iter()
            .filter(|r| r.date() >= latest)
            .map(|r| metric.of(r))
            .sum()
    }

    /// Sum of gross sales
    #[must_use]
    pub fn total_revenue(&self) -> f64 {
        self.receipts.iter().map(|r| r.gross_sales).sum()
    }

    /// Mean of the per-day revenue totals, over days with receipts
    #[must_use]
    pub fn daily_average_revenue(&self) -> f64 {
        let values: Vec<f64> = self.daily(Metric::Revenue).iter().map(|p| p.value).collect();
        mean(&values)
    }

    /// Revenue on the latest receipt date
    #[must_use]
    pub fn revenue_today(&self) -> f64 {
        self.on_latest_day(Metric::Revenue)
    }

    /// `(today - average) / average`, 0 when there is no average
    #[must_use]
    pub fn revenue_delta(&self) -> f64 {
        let average = self.daily_average_revenue();
        ratio(self.revenue_today() - average, average)
    }

    /// Total loads (sum of folds)
    #[must_use]
    pub fn total_load_count(&self) -> u64 {
        self.receipts.iter().map(|r| u64::from(r.items.fold)).sum()
    }

    /// Mean of the per-day load totals
    #[must_use]
    pub fn daily_average_load_count(&self) -> f64 {
        let values: Vec<f64> = self.daily(Metric::Loads).iter().map(|p| p.value).collect();
        mean(&values)
    }

    /// Loads on the latest receipt date
    #[must_use]
    pub fn load_count_today(&self) -> u64 {
        self.on_latest_day(Metric::Loads) as u64
    }

    /// `(today - average) / average` for loads
    #[must_use]
    pub fn load_count_delta(&self) -> f64 {
        let average = self.daily_average_load_count();
        ratio(self.load_count_today() as f64 - average, average)
    }

    /// Distinct customer names in the customer table
    #[must_use]
    pub fn total_customer_count(&self) -> usize {
        self.customers
            .iter()
            .map(|c| c.customer_name.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Customers with more than one receipt above the gross threshold
    #[must_use]
    pub fn returning_customer_count(&self) -> usize {
        let mut visits: HashMap<&str, usize> = HashMap::new();
        for receipt in self.receipts {
            if receipt.gross_sales <= self.returning_min_gross {
                continue;
            }
            if let Some(name) = receipt.customer_name.as_deref() {
                *visits.entry(name).or_default() += 1;
            }
        }
        visits.values().filter(|n| **n > 1).count()
    }

    /// Returning customers over all customers
    #[must_use]
    pub fn global_retention_rate(&self) -> f64 {
        ratio(
            self.returning_customer_count() as f64,
            self.total_customer_count() as f64,
        )
    }

    /// `1 - global_retention_rate`
    #[must_use]
    pub fn global_churn_rate(&self) -> f64 {
        1.0 - self.global_retention_rate()
    }

    /// Series of `metric` bucketed by `period`, oldest first
    #[must_use]
    pub fn series(&self, period: Period, aggregation: Aggregation, metric: Metric) -> Vec<PeriodValue> {
        aggregate_by_period(
            self.receipts,
            period,
            aggregation,
            |r| Some(r.date()),
            |r| metric.of(r),
        )
    }

    /// Distinct named customers per month, oldest first
    #[must_use]
    pub fn monthly_unique_customers(&self) -> Vec<PeriodValue> {
        let mut months: BTreeMap<NaiveDate, HashSet<&str>> = BTreeMap::new();
        for receipt in self.receipts {
            let set = months.entry(Period::Month.truncate(receipt.date())).or_default();
            if let Some(name) = receipt.customer_name.as_deref() {
                set.insert(name);
            }
        }
        months
            .into_iter()
            .map(|(period, names)| PeriodValue {
                period,
                value: names.len() as f64,
            })
            .collect()
    }

    /// Per-day summary for receipts in `range`, newest day first
    #[must_use]
    pub fn daily_summary(&self, range: DateRange) -> Vec<DailySummary> {
        let mut days: BTreeMap<NaiveDate, Vec<&Receipt>> = BTreeMap::new();
        for receipt in self.receipts.iter().filter(|r| range.contains(r.date())) {
            days.entry(receipt.date()).or_default().push(receipt);
        }

        days.into_iter()
            .rev()
            .map(|(date, receipts)| summarize_day(date, &receipts))
            .collect()
    }

    /// Loads per weekday and hour, sorted by weekday then hour
    #[must_use]
    pub fn peak_hours(&self) -> Vec<PeakHour> {
        let mut slots: BTreeMap<(u32, u32), u64> = BTreeMap::new();
        for receipt in self.receipts {
            let key = (
                receipt.timestamp.weekday().number_from_monday(),
                receipt.timestamp.hour(),
            );
            *slots.entry(key).or_default() += u64::from(receipt.items.fold);
        }
        slots
            .into_iter()
            .map(|((weekday, hour), load_count)| PeakHour {
                weekday,
                hour,
                load_count,
            })
            .collect()
    }
}

fn summarize_day(date: NaiveDate, receipts: &[&Receipt]) -> DailySummary {
    let customers: BTreeSet<&str> = receipts
        .iter()
        .filter_map(|r| r.customer_name.as_deref())
        .collect();
    let full_loads = receipts.iter().filter(|r| r.is_full_load).count() as u32;
    let titan_runs = receipts.iter().filter(|r| r.is_titan).count() as u32;
    let titan_usage =
        (full_loads > 0).then(|| (f64::from(titan_runs) / f64::from(full_loads) * 1000.0).round() / 1000.0);

    let first = receipts.iter().map(|r| r.timestamp).min();
    let last = receipts.iter().map(|r| r.timestamp).max();
    let hours_with_customer = match (first, last) {
        (Some(first), Some(last)) => (last - first).num_minutes() as f64 / 60.0,
        _ => 0.0,
    };

    DailySummary {
        date,
        total_gross: receipts.iter().map(|r| r.gross_sales).sum(),
        unique_customers: customers.len(),
        customers: customers.into_iter().map(str::to_string).collect(),
        full_loads,
        titan_runs,
        titan_usage,
        hours_with_customer,
        n_detergent: receipts.iter().map(|r| r.items.detergent).sum(),
        n_fabcon: receipts.iter().map(|r| r.items.fabcon).sum(),
        n_bleach: receipts.iter().map(|r| r.items.bleach).sum(),
        receipts: receipts.iter().map(|r| r.receipt_id.clone()).collect(),
    }
}

/// Centered rolling mean over an evenly spaced series
///
/// Each point averages the values from `ceil(window / 2)` before it to
/// `floor(window / 2)` after it, truncated at the ends of the series.
#[must_use]
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    if window == 0 {
        return values.to_vec();
    }
    let before = window.div_ceil(2);
    let after = window / 2;
    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(before);
            let hi = (i + after).min(values.len() - 1);
            mean(&values[lo..=hi])
        })
        .collect()
}

/// Receipts for any of `customers` (all when `None`) dated within
/// `start..=end`, both bounds optional
#[must_use]
pub fn filter_receipts<'r>(
    receipts: &'r [Receipt],
    customers: Option<&HashSet<String>>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<&'r Receipt> {
    receipts
        .iter()
        .filter(|r| {
            customers.is_none_or(|set| {
                r.customer_name.as_ref().is_some_and(|name| set.contains(name))
            })
        })
        .filter(|r| start.is_none_or(|s| r.date() >= s))
        .filter(|r| end.is_none_or(|e| r.date() <= e))
        .collect()
}

/// Receipts dated inside the half-open `range`
#[must_use]
pub fn filter_by_date(receipts: &[Receipt], range: DateRange) -> Vec<&Receipt> {
    receipts.iter().filter(|r| range.contains(r.date())).collect()
}
