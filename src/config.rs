use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDate;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::sheets::{SheetRange, SourceKind, SourceSettings};
use crate::validation::InputValidator;

/// Application configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub receipts: ReceiptsConfig,
    pub sheets: SheetsConfig,
    pub business: BusinessConfig,
}

/// Where the point-of-sale exports live
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub customers_dir: String,
    pub receipts_dir: String,
    pub holidays_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptsConfig {
    /// Accepted cashier names; empty accepts anyone
    pub cashiers: Vec<String>,
}

/// Expense spreadsheet access
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    /// "none", "google" or "csv"
    pub source: String,
    pub spreadsheet_id: String,
    pub api_key: String,
    pub base_url: String,
    pub csv_dir: String,
    pub has_header: bool,
    pub cache_dir: Option<String>,
    pub cache_ttl_secs: u64,
    pub request_timeout_secs: u64,
    pub ranges: Vec<SheetRange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessConfig {
    /// First day the shop was open
    pub opened_on: NaiveDate,
    /// Loads per free-load promo
    pub promo_every_loads: u32,
    /// Gross sales a receipt must exceed to count towards returning customers
    pub returning_min_gross: f64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            customers_dir: "data/customers".to_string(),
            receipts_dir: "data/receipts".to_string(),
            holidays_dir: "data/holidays".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "cleannest/db/main.db".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_path: None,
            format: "text".to_string(),
        }
    }
}

impl Default for ReceiptsConfig {
    fn default() -> Self {
        Self {
            cashiers: vec!["Hannah".to_string(), "Matet".to_string()],
        }
    }
}

impl Default for SheetsConfig {
    fn default() -> Self {
        let ranges = [
            ("capital_expenses", "A1:H108"),
            ("Jan2025", "A1:H4"),
            ("Feb2025", "A1:H25"),
            ("Mar2025", "A1:H27"),
            ("Apr2025", "A1:H41"),
            ("May2025", "A1:H30"),
            ("June2025", "A1:H33"),
            ("July2025", "A1:H41"),
            ("Aug2025", "A1:H38"),
        ]
        .into_iter()
        .map(|(sheet, range)| SheetRange::new(sheet, range))
        .collect();

        Self {
            source: "none".to_string(),
            spreadsheet_id: String::new(),
            api_key: String::new(),
            base_url: "https://sheets.googleapis.com".to_string(),
            csv_dir: "data/expenses".to_string(),
            has_header: true,
            cache_dir: Some(".sheet_cache".to_string()),
            cache_ttl_secs: 300,
            request_timeout_secs: 30,
            ranges,
        }
    }
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            opened_on: NaiveDate::from_ymd_opt(2025, 1, 18).unwrap_or_default(),
            promo_every_loads: 10,
            returning_min_gross: 100.0,
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    ///
    /// Later sources win: `config/default`, `config/local`, then
    /// `CLEANNEST_*` environment variables (`__` separates nested keys).
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Same as [`AppConfig::load`] with an extra file layered before the environment
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));
        if let Some(path) = path {
            builder = builder.add_source(File::from(path.to_path_buf()).required(true));
        }
        let config = builder
            .add_source(
                Environment::with_prefix("CLEANNEST")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("receipts.cashiers"),
            )
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.database.path.trim().is_empty() {
            return Err(anyhow::anyhow!("database.path must not be empty"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        let kind = self.sheets.kind()?;
        if kind == SourceKind::Google && self.sheets.spreadsheet_id.trim().is_empty() {
            return Err(anyhow::anyhow!("sheets.spreadsheet_id is required for the google source"));
        }
        if self.sheets.cache_ttl_secs == 0 {
            return Err(anyhow::anyhow!("cache_ttl_secs must be greater than 0"));
        }
        if self.sheets.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("request_timeout_secs must be greater than 0"));
        }
        for range in &self.sheets.ranges {
            InputValidator::validate_sheet_range(&range.range)
                .map_err(|e| anyhow::anyhow!("Invalid range for sheet {}: {}", range.sheet, e))?;
        }

        if self.business.promo_every_loads == 0 {
            return Err(anyhow::anyhow!("promo_every_loads must be greater than 0"));
        }

        Ok(())
    }

    /// Get log level from environment or config
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }

    /// Store location
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.database.path)
    }
}

impl SheetsConfig {
    /// Parsed backend kind
    pub fn kind(&self) -> Result<SourceKind> {
        self.source
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid sheets.source: {}", e))
    }

    /// Borrowed settings for [`crate::sheets::build_source`]
    pub fn source_settings(&self) -> Result<SourceSettings<'_>> {
        Ok(SourceSettings {
            kind: self.kind()?,
            spreadsheet_id: &self.spreadsheet_id,
            api_key: &self.api_key,
            base_url: &self.base_url,
            csv_dir: Path::new(&self.csv_dir),
            cache_dir: self.cache_dir.as_deref().map(Path::new),
            cache_ttl_secs: self.cache_ttl_secs,
            timeout: Duration::from_secs(self.request_timeout_secs),
        })
    }
}
