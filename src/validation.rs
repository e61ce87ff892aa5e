use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use std::path::Path;

use crate::sheets::A1Range;

/// Smallest rolling window the revenue charts accept
pub const MIN_WINDOW: usize = 7;
/// Largest rolling window the revenue charts accept
pub const MAX_WINDOW: usize = 180;

/// Validation utilities for command-line and form input
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate a customer name typed on the command line or order form
    pub fn validate_customer_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(anyhow!("Customer name cannot be empty"));
        }

        if name.len() > 100 {
            return Err(anyhow!("Customer name too long (max 100 characters)"));
        }

        if name.contains('\0') || name.contains('\r') || name.contains('\n') {
            return Err(anyhow!("Customer name contains invalid characters"));
        }

        Ok(())
    }

    /// Parse a `YYYY-MM-DD` argument
    pub fn parse_date(text: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .map_err(|e| anyhow!("Invalid date {text:?} (expected YYYY-MM-DD): {e}"))
    }

    /// Validate a date range; either bound may be open
    pub fn validate_date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<()> {
        if let (Some(start_date), Some(end_date)) = (start, end) {
            if start_date > end_date {
                return Err(anyhow!("Start date cannot be after end date"));
            }

            let days = (end_date - start_date).num_days();
            if days > 365 * 10 {
                return Err(anyhow!(
                    "Date range too large ({days} days). Maximum supported range is 10 years."
                ));
            }
        }

        Ok(())
    }

    /// Validate a rolling-mean window size
    pub fn validate_window_size(window: usize) -> Result<()> {
        if !(MIN_WINDOW..=MAX_WINDOW).contains(&window) {
            return Err(anyhow!(
                "Window size must be between {MIN_WINDOW} and {MAX_WINDOW} days, got {window}"
            ));
        }
        Ok(())
    }

    /// Validate an A1 range such as `A1:H108`
    pub fn validate_sheet_range(range: &str) -> Result<()> {
        range
            .parse::<A1Range>()
            .map(|_| ())
            .map_err(|e| anyhow!("{e}"))
    }

    /// Validate a sachet count on the order form
    pub fn validate_item_count(count: u32) -> Result<()> {
        if count > 20 {
            return Err(anyhow!("Item count too large (max 20)"));
        }
        Ok(())
    }

    /// Validate the store file path
    pub fn validate_store_path(path: &Path) -> Result<()> {
        let path_str = path.to_string_lossy();
        if path_str.trim().is_empty() {
            return Err(anyhow!("Store path cannot be empty"));
        }

        if path_str.contains("..") {
            return Err(anyhow!("Store path must not traverse parent directories"));
        }

        if path_str.len() > 4096 {
            return Err(anyhow!("Store path too long (max 4096 characters)"));
        }

        if path.is_dir() {
            return Err(anyhow!("Store path is a directory: {path:?}"));
        }

        Ok(())
    }

    /// Sanitize text input
    #[must_use]
    pub fn sanitize_text(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t' || *c == '\r')
            .collect::<String>()
            .trim()
            .to_string()
    }
}
