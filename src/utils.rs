//! Utility functions shared by the normalizer and the analytics.
//!
//! Text coercion (title case, amounts) and calendar helpers (month
//! truncation, month offsets, period bucketing).

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Calendar bucket used when grouping rows over time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// Calendar day
    Day,
    /// Calendar month, keyed by its first day
    Month,
}

impl Period {
    /// Truncate a date to the start of its bucket
    #[must_use]
    pub fn truncate(self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => date,
            Self::Month => month_start(date),
        }
    }
}

/// Reduction applied to each bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Sum of values
    Sum,
    /// Arithmetic mean
    Mean,
    /// Median (mean of the two middle values for even counts)
    Median,
}

impl Aggregation {
    /// Reduce a non-empty slice of values
    #[must_use]
    pub fn apply(self, values: &[f64]) -> f64 {
        match self {
            Self::Sum => values.iter().sum(),
            Self::Mean => mean(values),
            Self::Median => median(values),
        }
    }
}

/// One bucket of an aggregated time series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodValue {
    /// First day of the bucket
    pub period: NaiveDate,
    /// Aggregated value
    pub value: f64,
}

/// First day of the month containing `date`
#[must_use]
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Whole calendar months from `from` to `to`, ignoring the day of month
#[must_use]
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32)
}

/// First day of the month after the one containing `date`
#[must_use]
pub fn next_month(date: NaiveDate) -> NaiveDate {
    let start = month_start(date);
    start.checked_add_months(chrono::Months::new(1)).unwrap_or(start)
}

/// Group rows into calendar buckets and reduce each bucket
///
/// Rows without a date are skipped. The result is sorted ascending by period;
/// reverse it for tabular, newest-first display.
pub fn aggregate_by_period<T>(
    rows: &[T],
    period: Period,
    aggregation: Aggregation,
    date_of: impl Fn(&T) -> Option<NaiveDate>,
    value_of: impl Fn(&T) -> f64,
) -> Vec<PeriodValue> {
    let mut buckets: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for row in rows {
        if let Some(date) = date_of(row) {
            buckets.entry(period.truncate(date)).or_default().push(value_of(row));
        }
    }

    buckets
        .into_iter()
        .map(|(period, values)| PeriodValue {
            period,
            value: aggregation.apply(&values),
        })
        .collect()
}

/// Arithmetic mean, 0 for an empty slice
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Median, 0 for an empty slice
#[must_use]
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// `numerator / denominator`, or 0 when the denominator is 0
#[must_use]
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Uppercase the first letter of each word and lowercase the rest
///
/// A word starts after any non-alphanumeric character, so `o'brien` becomes
/// `O'Brien`.
#[must_use]
pub fn to_title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if in_word {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        in_word = c.is_alphanumeric();
    }
    out
}

/// Parse a money or count cell, tolerating thousands separators and a peso sign
///
/// Returns `None` for blank or malformed text so callers can choose between a
/// default and an error.
#[must_use]
pub fn parse_amount(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '₱' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Trimmed text, or `None` when empty
#[must_use]
pub fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Parse a date written in any of the formats the exports use
#[must_use]
pub fn parse_flexible_date(text: &str) -> Option<NaiveDate> {
    // Two-digit years first: `%Y` would read "25" as year 25.
    const FORMATS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%y", "%m/%d/%Y", "%b %d, %Y", "%B %d, %Y"];
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    // Exports sometimes append a time to visit dates.
    let date_part = trimmed.split_whitespace().next().unwrap_or(trimmed);
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .or_else(|| FORMATS.iter().find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn title_case_handles_apostrophes_and_spacing() {
        assert_eq!(to_title_case("juan DELA cruz"), "Juan Dela Cruz");
        assert_eq!(to_title_case("o'brien"), "O'Brien");
        assert_eq!(to_title_case(""), "");
    }

    #[test]
    fn amounts_strip_separators() {
        assert_eq!(parse_amount("1,250.50"), Some(1250.5));
        assert_eq!(parse_amount("₱ 80"), Some(80.0));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("n/a"), None);
    }

    #[test]
    fn months_between_crosses_years() {
        assert_eq!(months_between(d(2024, 11, 30), d(2025, 1, 1)), 2);
        assert_eq!(months_between(d(2025, 1, 1), d(2025, 1, 31)), 0);
    }

    #[test]
    fn next_month_rolls_over_december() {
        assert_eq!(next_month(d(2024, 12, 15)), d(2025, 1, 1));
    }

    #[test]
    fn aggregate_by_month_sorts_ascending() {
        let rows = vec![(d(2025, 2, 3), 10.0), (d(2025, 1, 9), 4.0), (d(2025, 2, 20), 6.0)];
        let sums = aggregate_by_period(&rows, Period::Month, Aggregation::Sum, |r| Some(r.0), |r| r.1);
        assert_eq!(sums.len(), 2);
        assert_eq!(sums[0].period, d(2025, 1, 1));
        assert_eq!(sums[1].value, 16.0);

        let medians = aggregate_by_period(&rows, Period::Month, Aggregation::Median, |r| Some(r.0), |r| r.1);
        assert_eq!(medians[1].value, 8.0);
    }

    #[test]
    fn ratio_never_divides_by_zero() {
        assert_eq!(ratio(3.0, 0.0), 0.0);
        assert_eq!(ratio(1.0, 4.0), 0.25);
    }

    #[test]
    fn flexible_dates() {
        assert_eq!(parse_flexible_date("2025-01-18"), Some(d(2025, 1, 18)));
        assert_eq!(parse_flexible_date("01/18/2025"), Some(d(2025, 1, 18)));
        assert_eq!(parse_flexible_date("1/18/25 9:30 AM"), Some(d(2025, 1, 18)));
        assert_eq!(parse_flexible_date(""), None);
    }
}
