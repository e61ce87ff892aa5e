//! Session-scoped order entry.
//!
//! Orders live only in memory for the lifetime of an [`OrderSession`]; nothing
//! here touches the store.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::catalog::find_item;
use crate::error::{CleannestError, Result};
use crate::models::{Customer, Item};

/// Machine or labour service picked on the order form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Service {
    /// Wash cycle
    Wash,
    /// Dry cycle
    Dry,
    /// Fold
    Fold,
}

/// Optional add-on picked on the order form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Extra {
    /// Ten extra minutes of drying
    ExtraDry,
    /// Hand wash
    HandWash,
}

impl FromStr for Service {
    type Err = CleannestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "wash" => Ok(Self::Wash),
            "dry" => Ok(Self::Dry),
            "fold" => Ok(Self::Fold),
            other => Err(CleannestError::InvalidField {
                field: "service",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for Extra {
    type Err = CleannestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "extra dry" => Ok(Self::ExtraDry),
            "hand wash" => Ok(Self::HandWash),
            other => Err(CleannestError::InvalidField {
                field: "extra",
                value: other.to_string(),
            }),
        }
    }
}

/// Everything the order form collects
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderRequest {
    /// Customer picked from the roster
    pub customer_name: String,
    /// Selected services
    pub services: BTreeSet<Service>,
    /// Selected extras
    pub extras: BTreeSet<Extra>,
    /// Use the TITAN machines
    pub use_titan: bool,
    /// Detergent sachets
    pub n_detergent: u32,
    /// Fabric conditioner sachets
    pub n_fabcon: u32,
    /// Bleach sachets
    pub n_bleach: u32,
}

/// A customer snapshot plus the catalog items they ordered
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    /// Customer as they were when the order was taken
    pub customer: Customer,
    /// Items in the order they were added
    pub items: Vec<Item>,
    /// Creation time
    pub created_at: NaiveDateTime,
    /// Last update time
    pub updated_at: NaiveDateTime,
    /// Soft-delete marker
    pub deleted_at: Option<NaiveDateTime>,
}

impl Order {
    /// Resolve a form submission against the catalog and the customer roster
    pub fn from_request(
        request: &OrderRequest,
        catalog: &[Item],
        customers: &[Customer],
        now: NaiveDateTime,
    ) -> Result<Self> {
        let customer = customers
            .iter()
            .find(|c| c.customer_name == request.customer_name)
            .cloned()
            .ok_or_else(|| CleannestError::NotFound(format!("customer {:?}", request.customer_name)))?;

        let machine = if request.use_titan { "TITAN" } else { "Regular" };
        let mut names: Vec<String> = Vec::new();
        if request.services.contains(&Service::Wash) {
            names.push(format!("{machine} Wash"));
        }
        if request.services.contains(&Service::Dry) {
            names.push(format!("{machine} Dry"));
        }
        if request.extras.contains(&Extra::ExtraDry) {
            names.push(format!("Extra {machine} Dry"));
        }
        if request.services.contains(&Service::Fold) {
            names.push("Fold".to_string());
        }
        for (count, name) in [
            (request.n_detergent, "Ariel Detergent"),
            (request.n_fabcon, "Downey Fabcon"),
            (request.n_bleach, "Zonrox Colorsafe Bleach"),
        ] {
            names.extend(std::iter::repeat(name.to_string()).take(count as usize));
        }
        if request.extras.contains(&Extra::HandWash) {
            names.push("Hand Wash".to_string());
        }

        let items = names
            .iter()
            .map(|name| find_item(catalog, name).cloned())
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            customer,
            items,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }

    /// Item names with their counts, in first-seen order
    #[must_use]
    pub fn quantities(&self) -> Vec<(String, u32)> {
        let mut counts: Vec<(String, u32)> = Vec::new();
        for item in &self.items {
            match counts.iter_mut().find(|(name, _)| *name == item.name) {
                Some((_, n)) => *n += 1,
                None => counts.push((item.name.clone(), 1)),
            }
        }
        counts
    }

    /// Items as `quantity x name` lines
    #[must_use]
    pub fn to_list(&self) -> Vec<String> {
        self.quantities()
            .into_iter()
            .map(|(name, quantity)| format!("{quantity} x {name}"))
            .collect()
    }

    /// Sum of item costs
    #[must_use]
    pub fn total(&self) -> f64 {
        self.items.iter().map(|item| item.cost).sum()
    }

    /// Flattened row for the session table
    #[must_use]
    pub fn to_row(&self) -> OrderRow {
        OrderRow {
            customer: self.customer.customer_name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            items: self.to_list(),
            total: self.total(),
        }
    }
}

/// One line of the session's order table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRow {
    /// Customer name
    pub customer: String,
    /// Creation time
    pub created_at: NaiveDateTime,
    /// Last update time
    pub updated_at: NaiveDateTime,
    /// `quantity x name` lines
    pub items: Vec<String>,
    /// Order total
    pub total: f64,
}

/// Orders taken during one interactive session
#[derive(Debug, Default)]
pub struct OrderSession {
    orders: Vec<Order>,
}

impl OrderSession {
    /// Empty session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an order and return its index
    pub fn add(&mut self, order: Order) -> usize {
        self.orders.push(order);
        self.orders.len() - 1
    }

    /// Remove the order at `index`
    pub fn remove(&mut self, index: usize) -> Result<Order> {
        if index >= self.orders.len() {
            return Err(CleannestError::NotFound(format!("order #{index}")));
        }
        Ok(self.orders.remove(index))
    }

    /// Orders in entry order
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Number of orders
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// No orders yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Table rows for every order
    #[must_use]
    pub fn rows(&self) -> Vec<OrderRow> {
        self.orders.iter().map(Order::to_row).collect()
    }

    /// Sum of all order totals
    #[must_use]
    pub fn grand_total(&self) -> f64 {
        self.orders.iter().map(Order::total).sum()
    }
}
