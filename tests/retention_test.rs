//! Churn, cohort and client-value analytics

use chrono::{NaiveDate, NaiveDateTime};
use cleannest::clients::{client_values, PROMO_EVERY_LOADS};
use cleannest::models::{Customer, ItemCounts, Receipt};
use cleannest::report::cohort_table;
use cleannest::retention::{active_customers_by_month, monthly_churn, CohortMatrix};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn visit(id: &str, day: &str, customer: Option<&str>, gross: f64, discount: f64, folds: u32) -> Receipt {
    Receipt {
        timestamp: NaiveDateTime::parse_from_str(day, "%Y-%m-%d %H:%M").unwrap(),
        receipt_id: id.to_string(),
        receipt_type: "Sale".to_string(),
        gross_sales: gross,
        discounts: discount,
        total_collected: gross - discount,
        payment_type: None,
        description: String::new(),
        cashier_name: "Matet".to_string(),
        customer_name: customer.map(str::to_string),
        status: "Closed".to_string(),
        items: ItemCounts {
            fold: folds,
            ..ItemCounts::default()
        },
        is_titan: false,
        is_full_load: false,
        has_extra: false,
    }
}

fn customer(id: &str, name: &str, phone: &str) -> Customer {
    Customer {
        customer_id: id.to_string(),
        customer_name: name.to_string(),
        email: None,
        phone: Some(phone.to_string()),
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

#[test]
fn test_churn_between_consecutive_months() {
    let receipts = vec![
        visit("1", "2025-01-05 09:00", Some("A"), 100.0, 0.0, 1),
        visit("2", "2025-01-06 09:00", Some("B"), 100.0, 0.0, 1),
        visit("3", "2025-01-07 09:00", Some("C"), 100.0, 0.0, 1),
        visit("4", "2025-02-05 09:00", Some("B"), 100.0, 0.0, 1),
        visit("5", "2025-02-06 09:00", Some("C"), 100.0, 0.0, 1),
        visit("6", "2025-02-07 09:00", Some("D"), 100.0, 0.0, 1),
    ];

    let churn = monthly_churn(&receipts);
    assert_eq!(churn.len(), 1);
    let feb = &churn[0];
    assert_eq!(feb.month, date(2025, 2, 1));
    assert_eq!(feb.lost_customers, 1);
    assert_eq!(feb.active_customers, 3);
    assert!((feb.churn_rate - 1.0 / 3.0).abs() < 1e-12);
    assert!((feb.retention_rate - 2.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_gap_months_count_as_empty() {
    let receipts = vec![
        visit("1", "2025-01-05 09:00", Some("A"), 100.0, 0.0, 1),
        visit("2", "2025-03-05 09:00", Some("A"), 100.0, 0.0, 1),
    ];

    let months = active_customers_by_month(&receipts);
    assert_eq!(months.len(), 3);
    assert!(months[&date(2025, 2, 1)].is_empty());

    let churn = monthly_churn(&receipts);
    assert_eq!(churn.len(), 2);
    assert_eq!(churn[0].month, date(2025, 2, 1));
    assert_eq!(churn[0].churn_rate, 1.0);
    assert_eq!(churn[0].active_customers, 0);
    // nobody was active in February, so nobody could be lost in March
    assert_eq!(churn[1].churn_rate, 0.0);
    assert_eq!(churn[1].retention_rate, 1.0);
}

#[test]
fn test_walk_ins_are_not_customers() {
    let receipts = vec![
        visit("1", "2025-01-05 09:00", None, 100.0, 0.0, 1),
        visit("2", "2025-02-05 09:00", Some("A"), 100.0, 0.0, 1),
    ];
    let months = active_customers_by_month(&receipts);
    assert!(months[&date(2025, 1, 1)].is_empty());
    assert_eq!(monthly_churn(&receipts)[0].churn_rate, 0.0);
}

#[test]
fn test_single_month_has_no_churn_rows() {
    let receipts = vec![visit("1", "2025-01-05 09:00", Some("A"), 100.0, 0.0, 1)];
    assert!(monthly_churn(&receipts).is_empty());
    assert!(monthly_churn(&[]).is_empty());
}

#[test]
fn test_cohort_matrix_counts() {
    let receipts = vec![
        visit("1", "2025-01-05 09:00", Some("A"), 100.0, 0.0, 1),
        visit("2", "2025-01-20 09:00", Some("A"), 100.0, 0.0, 1),
        visit("3", "2025-01-21 09:00", Some("B"), 100.0, 0.0, 1),
        visit("4", "2025-03-02 09:00", Some("A"), 100.0, 0.0, 1),
        visit("5", "2025-03-03 09:00", Some("C"), 100.0, 0.0, 1),
        visit("6", "2025-03-04 09:00", None, 100.0, 0.0, 1),
    ];

    let matrix = CohortMatrix::from_receipts(&receipts);
    assert_eq!(matrix.cohorts, vec![date(2025, 1, 1), date(2025, 3, 1)]);
    assert_eq!(matrix.counts, vec![vec![2, 0, 1], vec![1, 0, 0]]);
    assert_eq!(matrix.width(), 3);
    assert_eq!(matrix.cohort_sizes(), vec![2, 1]);
    assert_eq!(matrix.retention_rates()[0], vec![1.0, 0.0, 0.5]);
    assert_eq!(matrix.labels(), vec!["Jan 2025".to_string(), "Mar 2025".to_string()]);
}

#[test]
fn test_cohort_table_layout() {
    let receipts = vec![
        visit("1", "2025-01-05 09:00", Some("A"), 100.0, 0.0, 1),
        visit("2", "2025-02-05 09:00", Some("A"), 100.0, 0.0, 1),
    ];
    let table = cohort_table(&CohortMatrix::from_receipts(&receipts), false);
    assert_eq!(table.headers, vec!["cohort", "size", "0", "1"]);
    assert_eq!(table.rows, vec![vec!["Jan 2025", "1", "1", "1"]]);

    let rates = cohort_table(&CohortMatrix::from_receipts(&receipts), true);
    assert_eq!(rates.rows[0][2..], ["1.000", "1.000"]);
}

#[test]
fn test_empty_cohort_matrix() {
    let matrix = CohortMatrix::from_receipts(&[]);
    assert!(matrix.cohorts.is_empty());
    assert_eq!(matrix.width(), 0);
}

#[test]
fn test_client_values_join_on_name() {
    let customers = vec![
        customer("C1", "Ana Cruz", "0917 555 0101"),
        customer("C2", "Ben Reyes", "0917 555 0102"),
    ];
    let receipts = vec![
        visit("1", "2025-01-18 09:05", Some("Ana Cruz"), 255.0, 0.0, 1),
        visit("2", "2025-01-18 15:00", Some("Ana Cruz"), 100.0, 20.0, 2),
        visit("3", "2025-02-02 08:15", Some("Ana Cruz"), 200.0, 0.0, 1),
        visit("4", "2025-02-03 08:15", Some("Stranger"), 90.0, 0.0, 1),
        visit("5", "2025-02-03 09:15", None, 90.0, 0.0, 1),
    ];

    let values = client_values(&customers, &receipts, PROMO_EVERY_LOADS);
    assert_eq!(values.len(), 1);

    let ana = &values[0];
    assert_eq!(ana.customer_id, "C1");
    assert_eq!(ana.phone.as_deref(), Some("0917 555 0101"));
    assert_eq!(ana.total_spent, 555.0);
    assert_eq!(ana.mean_transaction_value, 185.0);
    assert_eq!(ana.total_discount, 20.0);
    assert_eq!(ana.lifetime_value, 535.0);
    assert_eq!(ana.total_loads, 4);
    assert_eq!(ana.n_transactions, 3);
    assert_eq!(ana.visits, vec!["2025-01-18".to_string(), "2025-02-02".to_string()]);
    assert_eq!(ana.tenure_days, 14);
    assert_eq!(ana.loads_until_promo, 6);
}

#[test]
fn test_loads_until_promo_resets_on_a_multiple() {
    let customers = vec![customer("C1", "Ana Cruz", "0917")];
    let receipts = vec![visit("1", "2025-01-18 09:05", Some("Ana Cruz"), 100.0, 0.0, 10)];
    assert_eq!(client_values(&customers, &receipts, 10)[0].loads_until_promo, 10);
    assert_eq!(client_values(&customers, &receipts, 4)[0].loads_until_promo, 2);
}

#[test]
fn test_client_values_sorted_by_name() {
    let customers = vec![customer("C2", "Zed", "1"), customer("C1", "Amy", "2")];
    let receipts = vec![
        visit("1", "2025-01-18 09:05", Some("Zed"), 100.0, 0.0, 1),
        visit("2", "2025-01-18 10:05", Some("Amy"), 100.0, 0.0, 1),
    ];
    let names: Vec<String> = client_values(&customers, &receipts, 10)
        .into_iter()
        .map(|c| c.customer_name)
        .collect();
    assert_eq!(names, vec!["Amy".to_string(), "Zed".to_string()]);
}
