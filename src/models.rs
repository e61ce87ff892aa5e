//! Data models for receipts, customers, expenses and the item catalog
//!
//! Raw records mirror the source files column for column and hold text only.
//! Typed records are produced by the extractor and the normalizer and are
//! what the store persists and the analytics consume.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::CleannestError;

/// A customer row exactly as exported by the point-of-sale system
///
/// Columns are mapped positionally; the export's own header names are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCustomer {
    /// Customer identifier
    pub customer_id: String,
    /// Full name
    pub customer_name: String,
    /// Email address
    pub email: String,
    /// Contact number
    pub phone: String,
    /// Street address
    pub address: String,
    /// City
    pub city: String,
    /// Province or state
    pub province: String,
    /// Postal code
    pub postal_code: String,
    /// Country
    pub country: String,
    /// Loyalty code
    pub customer_code: String,
    /// Loyalty points balance
    pub points_balance: String,
    /// Free-form note
    pub note: String,
    /// First visit date
    pub first_visit: String,
    /// Last visit date
    pub last_visit: String,
    /// Number of visits
    pub total_visits: String,
    /// Lifetime spend reported by the point-of-sale system
    pub total_spent: String,
}

/// A receipt row with the canonical column names applied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawReceipt {
    /// `M/D/YY h:mm AM|PM`
    pub timestamp: String,
    /// Receipt number
    pub receipt_id: String,
    /// Sale or refund
    pub receipt_type: String,
    /// Gross sales amount
    pub gross_sales: String,
    /// Discount amount
    pub discounts: String,
    /// Amount collected
    pub total_collected: String,
    /// Payment type
    pub payment_type: String,
    /// Free-text item list, e.g. `1 x TITAN Wash, 1 x Fold`
    pub description: String,
    /// Cashier on duty
    pub cashier_name: String,
    /// Customer name, empty for walk-ins
    pub customer_name: String,
    /// Receipt status
    pub status: String,
}

/// An expense line item as read from a spreadsheet range
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawExpense {
    /// `MM/DD/YYYY`
    pub date: String,
    /// Item purchased
    pub item: String,
    /// Note
    pub note: String,
    /// Category
    pub category: String,
    /// Subcategory
    pub subcategory: String,
    /// Quantity, may be blank
    pub quantity: String,
    /// Unit cost text
    pub unit: String,
    /// Total cost text, may contain thousands separators
    pub total_cost: String,
}

impl RawExpense {
    /// Build a raw expense from a positional row, padding missing trailing cells
    #[must_use]
    pub fn from_row(row: &[String]) -> Self {
        let cell = |i: usize| row.get(i).map(|s| s.trim().to_string()).unwrap_or_default();
        Self {
            date: cell(0),
            item: cell(1),
            note: cell(2),
            category: cell(3),
            subcategory: cell(4),
            quantity: cell(5),
            unit: cell(6),
            total_cost: cell(7),
        }
    }

    /// True when every cell is empty
    #[must_use]
    pub fn is_blank(&self) -> bool {
        [
            &self.date,
            &self.item,
            &self.note,
            &self.category,
            &self.subcategory,
            &self.quantity,
            &self.unit,
            &self.total_cost,
        ]
        .iter()
        .all(|s| s.is_empty())
    }
}

/// A normalized customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Unique identifier, kept as text
    pub customer_id: String,
    /// Title-cased name; receipts join on this
    pub customer_name: String,
    /// Email address
    pub email: Option<String>,
    /// Contact number
    pub phone: Option<String>,
    /// Street address
    pub address: Option<String>,
    /// City
    pub city: Option<String>,
    /// Province or state
    pub province: Option<String>,
    /// Postal code
    pub postal_code: Option<String>,
    /// Country
    pub country: Option<String>,
    /// Loyalty code
    pub customer_code: Option<String>,
    /// Loyalty points balance
    pub points_balance: f64,
    /// Free-form note
    pub note: Option<String>,
    /// First visit date
    pub first_visit: Option<NaiveDate>,
    /// Last visit date
    pub last_visit: Option<NaiveDate>,
    /// Number of visits
    pub total_visits: u32,
    /// Lifetime spend reported by the point-of-sale system
    pub total_spent: f64,
}

/// Accepted payment types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentType {
    /// Cash
    Cash,
    /// GCash e-wallet
    Gcash,
    /// Card
    Card,
}

impl PaymentType {
    /// Canonical text form
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "Cash",
            Self::Gcash => "Gcash",
            Self::Card => "Card",
        }
    }
}

impl FromStr for PaymentType {
    type Err = CleannestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Cash" => Ok(Self::Cash),
            "Gcash" => Ok(Self::Gcash),
            "Card" => Ok(Self::Card),
            other => Err(CleannestError::InvalidField {
                field: "payment_type",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-category item quantities parsed from a receipt description
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCounts {
    /// Washes, regular or TITAN
    pub wash: u32,
    /// Dries, regular or TITAN
    pub dry: u32,
    /// Folds
    pub fold: u32,
    /// Detergent sachets
    pub detergent: u32,
    /// Fabric conditioner sachets
    pub fabcon: u32,
    /// Bleach sachets
    pub bleach: u32,
}

impl ItemCounts {
    /// Wash, dry, fold, detergent and fabcon are all present
    #[must_use]
    pub const fn is_full_load(&self) -> bool {
        self.wash > 0 && self.dry > 0 && self.fold > 0 && self.detergent > 0 && self.fabcon > 0
    }

    /// Any bleach, or more than one detergent or fabcon
    #[must_use]
    pub const fn has_extra(&self) -> bool {
        self.bleach > 0 || self.detergent > 1 || self.fabcon > 1
    }

    /// The biggest single quantity
    #[must_use]
    pub fn largest(&self) -> u32 {
        [self.wash, self.dry, self.fold, self.detergent, self.fabcon, self.bleach]
            .into_iter()
            .max()
            .unwrap_or(0)
    }
}

/// A receipt with parsed timestamp, typed amounts and derived features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// When the sale was rung up
    pub timestamp: NaiveDateTime,
    /// Unique receipt number
    pub receipt_id: String,
    /// Sale or refund
    pub receipt_type: String,
    /// Gross sales amount
    pub gross_sales: f64,
    /// Discount amount
    pub discounts: f64,
    /// Amount collected
    pub total_collected: f64,
    /// Payment type, absent when the export left it blank
    pub payment_type: Option<PaymentType>,
    /// Free-text item list
    pub description: String,
    /// Cashier on duty
    pub cashier_name: String,
    /// Soft reference to `Customer::customer_name`
    pub customer_name: Option<String>,
    /// Receipt status
    pub status: String,
    /// Quantities parsed from the description
    pub items: ItemCounts,
    /// Description mentions a TITAN machine
    pub is_titan: bool,
    /// See [`ItemCounts::is_full_load`]
    pub is_full_load: bool,
    /// See [`ItemCounts::has_extra`]
    pub has_extra: bool,
}

impl Receipt {
    /// Calendar date of the sale
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// A normalized expense line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Purchase date
    pub date: Option<NaiveDate>,
    /// Item purchased; rows without one are hidden from analytics
    pub item_name: Option<String>,
    /// Note
    pub note: Option<String>,
    /// Category
    pub category: Option<String>,
    /// Subcategory
    pub subcategory: Option<String>,
    /// Quantity, 1 when blank
    pub quantity: i64,
    /// Unit cost, 0 when blank or malformed
    pub unit_cost: f64,
    /// Total cost, 0 when blank or malformed
    pub total_cost: f64,
}

/// Catalog category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemCategory {
    /// Consumables sold per sachet
    Soap,
    /// Machine or labour services
    Service,
}

impl ItemCategory {
    /// Canonical text form
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Soap => "soap",
            Self::Service => "service",
        }
    }
}

impl FromStr for ItemCategory {
    type Err = CleannestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "soap" => Ok(Self::Soap),
            "service" => Ok(Self::Service),
            other => Err(CleannestError::InvalidField {
                field: "category",
                value: other.to_string(),
            }),
        }
    }
}

/// A catalog item that can be added to an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Display name, unique within the catalog
    pub name: String,
    /// Soap or service
    pub category: ItemCategory,
    /// Unit price
    pub cost: f64,
    /// Creation time
    pub created_at: NaiveDateTime,
    /// Last update time
    pub updated_at: NaiveDateTime,
    /// Soft-delete marker
    pub deleted_at: Option<NaiveDateTime>,
}

impl Item {
    /// Item has not been soft-deleted
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// A public holiday
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    /// Date of the holiday
    pub date: NaiveDate,
    /// Name of the holiday
    pub description: String,
}

/// Half-open date range `[start, end)` for filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    /// Start date (inclusive, optional)
    pub start: Option<NaiveDate>,
    /// End date (exclusive, optional)
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Range with both bounds set
    #[must_use]
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Whether `date` falls inside the range
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date < e)
    }
}

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Comma-separated values format
    Csv,
    /// Aligned plain-text table
    Txt,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Get the file extension for this format
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Txt => "txt",
            Self::Json => "json",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = CleannestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "txt" | "text" => Ok(Self::Txt),
            "json" => Ok(Self::Json),
            other => Err(CleannestError::InvalidField {
                field: "format",
                value: other.to_string(),
            }),
        }
    }
}
