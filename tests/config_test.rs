//! Unit tests for config.rs module

use chrono::NaiveDate;
use cleannest::config::{AppConfig, BusinessConfig, LoggingConfig, SheetsConfig};
use cleannest::sheets::{SheetRange, SourceKind};
use std::io::Write;
use std::path::PathBuf;

fn write_config(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(body.as_bytes()).unwrap();
    path
}

#[test]
fn test_default_data_dirs() {
    let config = AppConfig::default();
    assert_eq!(config.data.customers_dir, "data/customers");
    assert_eq!(config.data.receipts_dir, "data/receipts");
    assert_eq!(config.data.holidays_dir, "data/holidays");
}

#[test]
fn test_default_logging_config() {
    let logging = LoggingConfig::default();
    assert_eq!(logging.level, "info");
    assert_eq!(logging.file_path, None);
    assert_eq!(logging.format, "text");
}

#[test]
fn test_default_cashier_roster() {
    let config = AppConfig::default();
    assert_eq!(config.receipts.cashiers, vec!["Hannah".to_string(), "Matet".to_string()]);
}

#[test]
fn test_default_sheets_config() {
    let sheets = SheetsConfig::default();
    assert_eq!(sheets.source, "none");
    assert_eq!(sheets.kind().unwrap(), SourceKind::None);
    assert!(sheets.has_header);
    assert_eq!(sheets.cache_ttl_secs, 300);
    assert_eq!(sheets.request_timeout_secs, 30);
    assert_eq!(sheets.ranges.first(), Some(&SheetRange::new("capital_expenses", "A1:H108")));
    assert_eq!(sheets.ranges.last(), Some(&SheetRange::new("Aug2025", "A1:H38")));
}

#[test]
fn test_default_business_config() {
    let business = BusinessConfig::default();
    assert_eq!(business.opened_on, NaiveDate::from_ymd_opt(2025, 1, 18).unwrap());
    assert_eq!(business.promo_every_loads, 10);
    assert_eq!(business.returning_min_gross, 100.0);
}

#[test]
fn test_database_path() {
    let config = AppConfig::default();
    assert_eq!(config.database_path(), PathBuf::from("cleannest/db/main.db"));
}

#[test]
fn test_validation_rejects_bad_log_level() {
    let mut config = AppConfig::default();
    config.logging.level = "verbose".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validation_rejects_bad_log_format() {
    let mut config = AppConfig::default();
    config.logging.format = "xml".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_validation_requires_spreadsheet_id_for_google() {
    let mut config = AppConfig::default();
    config.sheets.source = "google".to_string();
    assert!(config.validate().is_err());
    config.sheets.spreadsheet_id = "1AbC".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_validation_rejects_bad_range() {
    let mut config = AppConfig::default();
    config.sheets.ranges.push(SheetRange::new("Sep2025", "H40:A1"));
    assert!(config.validate().is_err());
}

#[test]
fn test_validation_rejects_zero_values() {
    let mut config = AppConfig::default();
    config.sheets.cache_ttl_secs = 0;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.sheets.request_timeout_secs = 0;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.business.promo_every_loads = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_validation_rejects_empty_database_path() {
    let mut config = AppConfig::default();
    config.database.path = "  ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_load_from_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        "cleannest.toml",
        r#"
[database]
path = "store/test.db"

[receipts]
cashiers = ["Hannah"]

[sheets]
source = "csv"
csv_dir = "exports"
cache_dir = "cache"

[[sheets.ranges]]
sheet = "Jan2025"
range = "A1:H4"

[business]
opened_on = "2025-02-01"
promo_every_loads = 8
"#,
    );

    let config = AppConfig::load_from(Some(&path)).unwrap();
    assert_eq!(config.database.path, "store/test.db");
    assert_eq!(config.receipts.cashiers, vec!["Hannah".to_string()]);
    assert_eq!(config.sheets.kind().unwrap(), SourceKind::Csv);
    assert_eq!(config.sheets.ranges, vec![SheetRange::new("Jan2025", "A1:H4")]);
    assert_eq!(config.business.opened_on, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
    assert_eq!(config.business.promo_every_loads, 8);
    // untouched sections keep their defaults
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.business.returning_min_gross, 100.0);
}

#[test]
fn test_load_from_rejects_invalid_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(&dir, "bad.toml", "[sheets]\nsource = \"ftp\"\n");
    assert!(AppConfig::load_from(Some(&path)).is_err());
}

#[test]
fn test_load_from_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(AppConfig::load_from(Some(&dir.path().join("absent.toml"))).is_err());
}

#[test]
fn test_source_settings_borrow_config() {
    let mut sheets = SheetsConfig::default();
    sheets.source = "csv".to_string();
    sheets.cache_dir = None;
    let settings = sheets.source_settings().unwrap();
    assert_eq!(settings.kind, SourceKind::Csv);
    assert_eq!(settings.csv_dir, std::path::Path::new("data/expenses"));
    assert!(settings.cache_dir.is_none());
    assert_eq!(settings.timeout, std::time::Duration::from_secs(30));
}
