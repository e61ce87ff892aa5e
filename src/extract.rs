//! Receipt feature extraction
//!
//! Turns raw receipt rows into typed [`Receipt`]s: cancelled receipts are
//! dropped, timestamps parsed, item quantities read out of the free-text
//! description and the derived flags computed.

use chrono::NaiveDateTime;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{CleannestError, Result};
use crate::models::{ItemCounts, PaymentType, RawReceipt, Receipt};
use crate::utils::{non_empty, parse_amount};

/// Timestamp layout of the point-of-sale export, e.g. `1/18/25 9:05 AM`
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%y %I:%M %p";

/// Status value that removes a receipt from every table
pub const CANCELLED_STATUS: &str = "Cancelled";

/// Largest quantity a single description line may carry
pub const MAX_ITEM_QUANTITY: u32 = 1_000;

/// Item categories counted from receipt descriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// Regular or TITAN wash
    Wash,
    /// Regular or TITAN dry
    Dry,
    /// Fold service
    Fold,
    /// Ariel liquid detergent
    Detergent,
    /// Downy fabric conditioner
    Fabcon,
    /// Zonrox colorsafe bleach
    Bleach,
}

impl ItemKind {
    /// Every kind, in column order
    pub const ALL: [Self; 6] = [
        Self::Wash,
        Self::Dry,
        Self::Fold,
        Self::Detergent,
        Self::Fabcon,
        Self::Bleach,
    ];

    /// Description pattern; the first capture group is the quantity
    #[must_use]
    pub const fn pattern(&self) -> &'static str {
        match self {
            Self::Wash => r"\b(\d+) x (?:TITAN )?Wash",
            Self::Dry => r"\b(\d+) x (?:TITAN )?Dry",
            Self::Fold => r"\b(\d+) x Fold",
            Self::Detergent => r"\b(\d+) x Ariel Liquid Detergent",
            Self::Fabcon => r"\b(\d+) x Downy Fabcon",
            Self::Bleach => r"\b(\d+) x Zonrox Colorsafe Bleach",
        }
    }

    fn slot<'a>(&self, counts: &'a mut ItemCounts) -> &'a mut u32 {
        match self {
            Self::Wash => &mut counts.wash,
            Self::Dry => &mut counts.dry,
            Self::Fold => &mut counts.fold,
            Self::Detergent => &mut counts.detergent,
            Self::Fabcon => &mut counts.fabcon,
            Self::Bleach => &mut counts.bleach,
        }
    }
}

/// Parse a point-of-sale timestamp
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT)
        .map_err(|e| CleannestError::InvalidDate(format!("{text:?}: {e}")))
}

/// Compiled extractor for receipt descriptions
#[derive(Debug, Clone)]
pub struct ReceiptExtractor {
    patterns: Vec<(ItemKind, Regex)>,
    cashiers: Vec<String>,
}

impl ReceiptExtractor {
    /// Create an extractor; an empty roster accepts any cashier name
    pub fn new(cashiers: &[String]) -> Result<Self> {
        let patterns = ItemKind::ALL
            .iter()
            .map(|kind| Ok((*kind, Regex::new(kind.pattern())?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            patterns,
            cashiers: cashiers.to_vec(),
        })
    }

    /// Count items of each kind in a description
    #[must_use]
    pub fn item_counts(&self, description: &str) -> ItemCounts {
        let mut counts = ItemCounts::default();
        for (kind, regex) in &self.patterns {
            let Some(captures) = regex.captures(description) else {
                continue;
            };
            let digits = captures.get(1).map_or("", |m| m.as_str());
            *kind.slot(&mut counts) = digits.parse().unwrap_or_else(|_| {
                warn!(quantity = digits, ?kind, "Quantity does not fit, saturating");
                u32::MAX
            });
        }
        counts
    }

    /// Extract one receipt; `Ok(None)` when it was cancelled
    pub fn extract(&self, raw: RawReceipt) -> Result<Option<Receipt>> {
        if raw.status == CANCELLED_STATUS {
            debug!(receipt_id = %raw.receipt_id, "Dropping cancelled receipt");
            return Ok(None);
        }

        let timestamp = parse_timestamp(&raw.timestamp).map_err(|e| match e {
            CleannestError::InvalidDate(msg) => {
                CleannestError::InvalidDate(format!("receipt {}: {msg}", raw.receipt_id))
            }
            other => other,
        })?;

        let payment_type = match non_empty(&raw.payment_type) {
            Some(text) => Some(text.parse::<PaymentType>()?),
            None => None,
        };

        if !self.cashiers.is_empty() && !self.cashiers.iter().any(|c| *c == raw.cashier_name) {
            return Err(CleannestError::InvalidField {
                field: "cashier_name",
                value: raw.cashier_name,
            });
        }

        let items = self.item_counts(&raw.description);
        if items.largest() > MAX_ITEM_QUANTITY {
            return Err(CleannestError::InvalidField {
                field: "description",
                value: raw.description,
            });
        }
        let is_titan = raw.description.contains("TITAN");

        Ok(Some(Receipt {
            timestamp,
            gross_sales: money("gross_sales", &raw.gross_sales)?,
            discounts: money("discounts", &raw.discounts)?,
            total_collected: money("total_collected", &raw.total_collected)?,
            receipt_id: raw.receipt_id,
            receipt_type: raw.receipt_type,
            payment_type,
            cashier_name: raw.cashier_name,
            customer_name: non_empty(&raw.customer_name),
            status: raw.status,
            is_titan,
            is_full_load: items.is_full_load(),
            has_extra: items.has_extra(),
            items,
            description: raw.description,
        }))
    }

    /// Extract a whole batch, dropping cancelled receipts
    ///
    /// The first malformed row fails the batch; nothing partial is returned.
    pub fn extract_all(&self, raws: Vec<RawReceipt>) -> Result<Vec<Receipt>> {
        let mut receipts = Vec::with_capacity(raws.len());
        for raw in raws {
            if let Some(receipt) = self.extract(raw)? {
                receipts.push(receipt);
            }
        }
        Ok(receipts)
    }
}

/// Blank means zero; anything else must be a number
fn money(field: &'static str, text: &str) -> Result<f64> {
    if text.trim().is_empty() {
        return Ok(0.0);
    }
    parse_amount(text).ok_or_else(|| CleannestError::InvalidField {
        field,
        value: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn extractor() -> ReceiptExtractor {
        ReceiptExtractor::new(&[]).unwrap()
    }

    #[test]
    fn parses_single_digit_fields() {
        let ts = parse_timestamp("1/8/25 9:05 PM").unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2025, 1, 8).unwrap());
        assert_eq!(ts.hour(), 21);
        assert_eq!(ts.minute(), 5);
    }

    #[test]
    fn rejects_iso_timestamps() {
        assert!(parse_timestamp("2025-01-08 21:05").is_err());
    }

    #[test]
    fn counts_each_category() {
        let counts = extractor().item_counts(
            "1 x TITAN Wash, 2 x TITAN Dry, 1 x Fold, 3 x Ariel Liquid Detergent, 1 x Downy Fabcon, 1 x Zonrox Colorsafe Bleach",
        );
        assert_eq!(
            counts,
            ItemCounts {
                wash: 1,
                dry: 2,
                fold: 1,
                detergent: 3,
                fabcon: 1,
                bleach: 1,
            }
        );
    }

    #[test]
    fn extra_dry_and_hand_wash_do_not_count() {
        let counts = extractor().item_counts("1 x Extra TITAN Dry, 1 x Hand Wash");
        assert_eq!(counts.dry, 0);
        assert_eq!(counts.wash, 0);
    }

    #[test]
    fn double_digit_quantities_are_read_whole() {
        assert_eq!(extractor().item_counts("12 x Wash").wash, 12);
    }

    #[test]
    fn oversized_quantities_saturate() {
        assert_eq!(extractor().item_counts("99999999999 x Fold").fold, u32::MAX);
    }
}
