//! Static item catalog seeded into the `items` table.

use chrono::NaiveDateTime;

use crate::error::{CleannestError, Result};
use crate::models::{Item, ItemCategory};

/// Seed rows: name, category, unit cost
const SEED: [(&str, ItemCategory, f64); 11] = [
    ("Ariel Detergent", ItemCategory::Soap, 18.0),
    ("Downey Fabcon", ItemCategory::Soap, 12.0),
    ("Zonrox Colorsafe Bleach", ItemCategory::Soap, 6.0),
    ("Regular Wash", ItemCategory::Service, 65.0),
    ("TITAN Wash", ItemCategory::Service, 80.0),
    ("Hand Wash", ItemCategory::Service, 45.0),
    ("Regular Dry", ItemCategory::Service, 65.0),
    ("TITAN Dry", ItemCategory::Service, 90.0),
    ("Extra Regular Dry", ItemCategory::Service, 17.0),
    ("Extra TITAN Dry", ItemCategory::Service, 17.0),
    ("Fold", ItemCategory::Service, 35.0),
];

/// The shop's price list, stamped with `now`
#[must_use]
pub fn default_items(now: NaiveDateTime) -> Vec<Item> {
    SEED.iter()
        .map(|(name, category, cost)| Item {
            name: (*name).to_string(),
            category: *category,
            cost: *cost,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
        .collect()
}

/// Find an active item by exact name
pub fn find_item<'a>(items: &'a [Item], name: &str) -> Result<&'a Item> {
    items
        .iter()
        .find(|item| item.is_active() && item.name == name)
        .ok_or_else(|| CleannestError::NotFound(format!("catalog item {name:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 18).unwrap().and_hms_opt(8, 0, 0).unwrap()
    }

    #[test]
    fn seed_has_unique_names() {
        let items = default_items(stamp());
        let mut names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), items.len());
    }

    #[test]
    fn deleted_items_are_not_found() {
        let mut items = default_items(stamp());
        items[0].deleted_at = Some(stamp());
        assert!(find_item(&items, "Ariel Detergent").is_err());
        assert_eq!(find_item(&items, "Fold").unwrap().cost, 35.0);
    }
}
