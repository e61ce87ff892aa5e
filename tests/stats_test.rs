//! Revenue, load and customer statistics over a small receipt snapshot

use chrono::{NaiveDate, NaiveDateTime};
use cleannest::models::{Customer, DateRange, ItemCounts, Receipt};
use cleannest::stats::{filter_by_date, filter_receipts, rolling_mean, Metric, Stats};
use cleannest::utils::{Aggregation, Period};
use std::collections::HashSet;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(text: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M").unwrap()
}

fn receipt(id: &str, timestamp: &str, customer: Option<&str>, gross: f64, items: ItemCounts, titan: bool) -> Receipt {
    Receipt {
        timestamp: at(timestamp),
        receipt_id: id.to_string(),
        receipt_type: "Sale".to_string(),
        gross_sales: gross,
        discounts: 0.0,
        total_collected: gross,
        payment_type: None,
        description: String::new(),
        cashier_name: "Hannah".to_string(),
        customer_name: customer.map(str::to_string),
        status: "Closed".to_string(),
        is_titan: titan,
        is_full_load: items.is_full_load(),
        has_extra: items.has_extra(),
        items,
    }
}

fn full_load() -> ItemCounts {
    ItemCounts {
        wash: 1,
        dry: 1,
        fold: 1,
        detergent: 1,
        fabcon: 1,
        bleach: 0,
    }
}

fn customer(id: &str, name: &str) -> Customer {
    Customer {
        customer_id: id.to_string(),
        customer_name: name.to_string(),
        email: None,
        phone: None,
        address: None,
        city: None,
        province: None,
        postal_code: None,
        country: None,
        customer_code: None,
        points_balance: 0.0,
        note: None,
        first_visit: None,
        last_visit: None,
        total_visits: 0,
        total_spent: 0.0,
    }
}

/// Two trading days: Saturday 2025-01-18 and Sunday 2025-02-02
fn snapshot() -> (Vec<Customer>, Vec<Receipt>) {
    let customers = vec![
        customer("C1", "Ana Cruz"),
        customer("C2", "Ben Reyes"),
        customer("C3", "Ana Cruz"),
    ];
    let receipts = vec![
        receipt(
            "1-1004",
            "2025-02-02 10:45",
            Some("Ben Reyes"),
            150.0,
            ItemCounts {
                fold: 2,
                ..ItemCounts::default()
            },
            false,
        ),
        receipt("1-1003", "2025-02-02 08:15", Some("Ana Cruz"), 200.0, full_load(), false),
        receipt(
            "1-1002",
            "2025-01-18 13:30",
            None,
            140.0,
            ItemCounts {
                wash: 1,
                dry: 1,
                ..ItemCounts::default()
            },
            false,
        ),
        receipt("1-1001", "2025-01-18 09:05", Some("Ana Cruz"), 255.0, full_load(), true),
    ];
    (customers, receipts)
}

#[test]
fn test_revenue_figures() {
    let (customers, receipts) = snapshot();
    let stats = Stats::new(&customers, &receipts);

    assert_eq!(stats.latest_date(), Some(date(2025, 2, 2)));
    assert_eq!(stats.total_revenue(), 745.0);
    assert_eq!(stats.daily_average_revenue(), 372.5);
    assert_eq!(stats.revenue_today(), 350.0);
    assert!((stats.revenue_delta() - (350.0 - 372.5) / 372.5).abs() < 1e-12);
}

#[test]
fn test_load_figures() {
    let (customers, receipts) = snapshot();
    let stats = Stats::new(&customers, &receipts);

    assert_eq!(stats.total_load_count(), 4);
    assert_eq!(stats.daily_average_load_count(), 2.0);
    assert_eq!(stats.load_count_today(), 3);
    assert_eq!(stats.load_count_delta(), 0.5);
}

#[test]
fn test_customer_figures() {
    let (customers, receipts) = snapshot();
    let stats = Stats::new(&customers, &receipts);

    assert_eq!(stats.total_customer_count(), 2);
    assert_eq!(stats.returning_customer_count(), 1);
    assert_eq!(stats.global_retention_rate(), 0.5);
    assert_eq!(stats.global_churn_rate(), 0.5);
}

#[test]
fn test_returning_threshold_is_configurable() {
    let (customers, receipts) = snapshot();
    let stats = Stats::new(&customers, &receipts).with_returning_min_gross(210.0);
    assert_eq!(stats.returning_customer_count(), 0);
    assert_eq!(stats.global_churn_rate(), 1.0);
}

#[test]
fn test_monthly_unique_customers_skip_walk_ins() {
    let (customers, receipts) = snapshot();
    let months = Stats::new(&customers, &receipts).monthly_unique_customers();
    let values: Vec<(NaiveDate, f64)> = months.iter().map(|p| (p.period, p.value)).collect();
    assert_eq!(values, vec![(date(2025, 1, 1), 1.0), (date(2025, 2, 1), 2.0)]);
}

#[test]
fn test_series_by_period_and_aggregation() {
    let (customers, receipts) = snapshot();
    let stats = Stats::new(&customers, &receipts);

    let monthly = stats.series(Period::Month, Aggregation::Sum, Metric::Revenue);
    assert_eq!(monthly.iter().map(|p| p.value).collect::<Vec<_>>(), vec![395.0, 350.0]);

    let daily_mean = stats.series(Period::Day, Aggregation::Mean, Metric::Revenue);
    assert_eq!(daily_mean[0].period, date(2025, 1, 18));
    assert_eq!(daily_mean[0].value, 197.5);

    let full_loads = stats.series(Period::Month, Aggregation::Sum, Metric::FullLoads);
    assert_eq!(full_loads.iter().map(|p| p.value).collect::<Vec<_>>(), vec![1.0, 1.0]);
}

#[test]
fn test_daily_summary_newest_first() {
    let (customers, receipts) = snapshot();
    let days = Stats::new(&customers, &receipts).daily_summary(DateRange::default());
    assert_eq!(days.len(), 2);

    let sunday = &days[0];
    assert_eq!(sunday.date, date(2025, 2, 2));
    assert_eq!(sunday.total_gross, 350.0);
    assert_eq!(sunday.unique_customers, 2);
    assert_eq!(sunday.customers, vec!["Ana Cruz".to_string(), "Ben Reyes".to_string()]);
    assert_eq!(sunday.full_loads, 1);
    assert_eq!(sunday.titan_runs, 0);
    assert_eq!(sunday.titan_usage, Some(0.0));
    assert_eq!(sunday.hours_with_customer, 2.5);
    assert_eq!(sunday.n_detergent, 1);

    let saturday = &days[1];
    assert_eq!(saturday.unique_customers, 1);
    assert_eq!(saturday.titan_usage, Some(1.0));
    assert_eq!(saturday.receipts, vec!["1-1002".to_string(), "1-1001".to_string()]);
}

#[test]
fn test_daily_summary_without_full_loads_has_no_titan_usage() {
    let receipts = vec![receipt(
        "1",
        "2025-03-01 10:00",
        Some("Ana Cruz"),
        65.0,
        ItemCounts {
            wash: 1,
            ..ItemCounts::default()
        },
        true,
    )];
    let days = Stats::new(&[], &receipts).daily_summary(DateRange::default());
    assert_eq!(days[0].titan_runs, 1);
    assert_eq!(days[0].titan_usage, None);
    assert_eq!(days[0].hours_with_customer, 0.0);
}

#[test]
fn test_daily_summary_range_is_half_open() {
    let (customers, receipts) = snapshot();
    let stats = Stats::new(&customers, &receipts);
    let days = stats.daily_summary(DateRange::new(date(2025, 1, 18), date(2025, 2, 2)));
    assert_eq!(days.len(), 1);
    assert_eq!(days[0].date, date(2025, 1, 18));
}

#[test]
fn test_peak_hours_sum_loads_per_slot() {
    let (customers, receipts) = snapshot();
    let slots: Vec<(u32, u32, u64)> = Stats::new(&customers, &receipts)
        .peak_hours()
        .iter()
        .map(|p| (p.weekday, p.hour, p.load_count))
        .collect();
    assert_eq!(slots, vec![(6, 9, 1), (6, 13, 0), (7, 8, 1), (7, 10, 2)]);
}

#[test]
fn test_filter_receipts_by_customer_and_inclusive_dates() {
    let (_, receipts) = snapshot();
    let ana: HashSet<String> = ["Ana Cruz".to_string()].into_iter().collect();

    assert_eq!(filter_receipts(&receipts, Some(&ana), None, None).len(), 2);

    let january = filter_receipts(&receipts, Some(&ana), None, Some(date(2025, 1, 18)));
    assert_eq!(january.len(), 1);
    assert_eq!(january[0].receipt_id, "1-1001");

    // the end day is included in full
    assert_eq!(filter_receipts(&receipts, None, Some(date(2025, 2, 2)), Some(date(2025, 2, 2))).len(), 2);
    assert_eq!(filter_receipts(&receipts, None, None, None).len(), 4);
}

#[test]
fn test_filter_by_date_excludes_end() {
    let (_, receipts) = snapshot();
    let range = DateRange::new(date(2025, 1, 1), date(2025, 2, 2));
    assert_eq!(filter_by_date(&receipts, range).len(), 2);
}

#[test]
fn test_rolling_mean_smooths_a_series() {
    let values = [10.0, 20.0, 30.0, 40.0];
    let smoothed = rolling_mean(&values, 2);
    assert_eq!(smoothed, vec![15.0, 20.0, 30.0, 35.0]);
    assert_eq!(rolling_mean(&values, 0), values.to_vec());
}
