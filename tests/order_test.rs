//! Order entry against the item catalog

use chrono::{NaiveDate, NaiveDateTime};
use cleannest::catalog::{default_items, find_item};
use cleannest::models::Customer;
use cleannest::order::{Extra, Order, OrderRequest, OrderSession, Service};
use cleannest::CleannestError;

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 1)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap()
}

fn roster() -> Vec<Customer> {
    vec![Customer {
        customer_id: "C1".to_string(),
        customer_name: "Ana Cruz".to_string(),
        email: None,
        phone: Some("0917 555 0101".to_string()),
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
        total_visits: 3,
        total_spent: 555.0,
    }]
}

fn request(titan: bool) -> OrderRequest {
    OrderRequest {
        customer_name: "Ana Cruz".to_string(),
        services: [Service::Wash, Service::Dry, Service::Fold].into_iter().collect(),
        extras: [Extra::ExtraDry, Extra::HandWash].into_iter().collect(),
        use_titan: titan,
        n_detergent: 2,
        n_fabcon: 1,
        n_bleach: 0,
    }
}

#[test]
fn test_full_regular_order() {
    let order = Order::from_request(&request(false), &default_items(now()), &roster(), now()).unwrap();

    let names: Vec<&str> = order.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Regular Wash",
            "Regular Dry",
            "Extra Regular Dry",
            "Fold",
            "Ariel Detergent",
            "Ariel Detergent",
            "Downey Fabcon",
            "Hand Wash",
        ]
    );
    assert_eq!(order.total(), 65.0 + 65.0 + 17.0 + 35.0 + 18.0 * 2.0 + 12.0 + 45.0);
    assert_eq!(order.customer.customer_id, "C1");
    assert_eq!(order.created_at, now());
    assert_eq!(order.deleted_at, None);
}

#[test]
fn test_titan_order_uses_titan_machines() {
    let mut req = request(true);
    req.extras.clear();
    req.n_detergent = 0;
    req.n_fabcon = 0;
    let order = Order::from_request(&req, &default_items(now()), &roster(), now()).unwrap();
    assert_eq!(order.to_list(), vec!["1 x TITAN Wash", "1 x TITAN Dry", "1 x Fold"]);
    assert_eq!(order.total(), 80.0 + 90.0 + 35.0);
}

#[test]
fn test_quantities_group_repeated_items() {
    let order = Order::from_request(&request(false), &default_items(now()), &roster(), now()).unwrap();
    let quantities = order.quantities();
    assert!(quantities.contains(&("Ariel Detergent".to_string(), 2)));
    assert!(order.to_list().contains(&"2 x Ariel Detergent".to_string()));
    assert_eq!(quantities.len(), 7);
}

#[test]
fn test_unknown_customer_is_rejected() {
    let mut req = request(false);
    req.customer_name = "Nobody".to_string();
    let err = Order::from_request(&req, &default_items(now()), &roster(), now()).unwrap_err();
    assert!(matches!(err, CleannestError::NotFound(_)));
}

#[test]
fn test_deleted_catalog_items_cannot_be_ordered() {
    let mut items = default_items(now());
    for item in items.iter_mut().filter(|i| i.name == "Fold") {
        item.deleted_at = Some(now());
    }
    assert!(find_item(&items, "Fold").is_err());
    assert!(Order::from_request(&request(false), &items, &roster(), now()).is_err());
}

#[test]
fn test_empty_request_is_an_empty_order() {
    let req = OrderRequest {
        customer_name: "Ana Cruz".to_string(),
        ..OrderRequest::default()
    };
    let order = Order::from_request(&req, &default_items(now()), &roster(), now()).unwrap();
    assert!(order.items.is_empty());
    assert_eq!(order.total(), 0.0);
}

#[test]
fn test_service_and_extra_parsing() {
    assert_eq!("Wash".parse::<Service>().unwrap(), Service::Wash);
    assert_eq!(" fold ".parse::<Service>().unwrap(), Service::Fold);
    assert!("iron".parse::<Service>().is_err());
    assert_eq!("Extra Dry".parse::<Extra>().unwrap(), Extra::ExtraDry);
    assert_eq!("hand-wash".parse::<Extra>().unwrap(), Extra::HandWash);
    assert_eq!("hand_wash".parse::<Extra>().unwrap(), Extra::HandWash);
    assert!("starch".parse::<Extra>().is_err());
}

#[test]
fn test_session_add_remove_and_totals() {
    let items = default_items(now());
    let mut session = OrderSession::new();
    assert!(session.is_empty());

    let first = Order::from_request(&request(false), &items, &roster(), now()).unwrap();
    let second = Order::from_request(&request(true), &items, &roster(), now()).unwrap();
    let expected = first.total() + second.total();

    assert_eq!(session.add(first), 0);
    assert_eq!(session.add(second), 1);
    assert_eq!(session.len(), 2);
    assert_eq!(session.grand_total(), expected);

    let rows = session.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].customer, "Ana Cruz");
    assert_eq!(rows[1].items[0], "1 x TITAN Wash");

    let removed = session.remove(0).unwrap();
    assert!(removed.items.iter().any(|i| i.name == "Regular Wash"));
    assert_eq!(session.orders().len(), 1);
    assert!(matches!(session.remove(5), Err(CleannestError::NotFound(_))));
}
