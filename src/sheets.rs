//! Spreadsheet range sources for the expense ledger.
//!
//! Expenses live in a spreadsheet with one tab per month. Each tab is read
//! through a [`SheetSource`] addressed by tab name and A1 range; the Google
//! Sheets values API and a directory of per-tab CSV exports are the two
//! implementations, and either can be wrapped in an on-disk cache.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use csv::ReaderBuilder;
use reqwest::blocking::Client;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::RangeCache;
use crate::error::{CleannestError, Result};
use crate::models::RawExpense;

/// A rectangular cell block such as `A1:H108`
///
/// Columns are zero-based indices, rows are one-based like the sheet itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct A1Range {
    /// First column index
    pub first_col: usize,
    /// First row number
    pub first_row: usize,
    /// Last column index (inclusive)
    pub last_col: usize,
    /// Last row number (inclusive)
    pub last_row: usize,
}

impl A1Range {
    fn parse_cell(cell: &str) -> Option<(usize, usize)> {
        let split = cell.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = cell.split_at(split);
        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        let col = letters
            .chars()
            .try_fold(0usize, |acc, c| {
                let value = (c.to_ascii_uppercase() as usize) - ('A' as usize) + 1;
                acc.checked_mul(26)?.checked_add(value)
            })?
            - 1;
        let row: usize = digits.parse().ok().filter(|r| *r > 0)?;
        Some((col, row))
    }

    /// Number of columns covered
    #[must_use]
    pub const fn width(&self) -> usize {
        self.last_col - self.first_col + 1
    }
}

impl FromStr for A1Range {
    type Err = CleannestError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CleannestError::InvalidRange(s.to_string());
        let (start, end) = s.trim().split_once(':').ok_or_else(invalid)?;
        let (first_col, first_row) = Self::parse_cell(start).ok_or_else(invalid)?;
        let (last_col, last_row) = Self::parse_cell(end).ok_or_else(invalid)?;
        if last_col < first_col || last_row < first_row {
            return Err(invalid());
        }
        Ok(Self {
            first_col,
            first_row,
            last_col,
            last_row,
        })
    }
}

/// A tab name plus an A1 range within it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRange {
    /// Tab name, e.g. `Jan2025`
    pub sheet: String,
    /// A1 range, e.g. `A1:H4`
    pub range: String,
}

impl SheetRange {
    /// Convenience constructor
    pub fn new(sheet: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            range: range.into(),
        }
    }

    /// Parsed form of [`SheetRange::range`]
    pub fn cells(&self) -> Result<A1Range> {
        self.range.parse()
    }
}

impl fmt::Display for SheetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}", self.sheet, self.range)
    }
}

/// Anything that can return the cell values of a sheet range
///
/// Rows come back as text in sheet order; an empty range yields no rows.
#[cfg_attr(test, mockall::automock)]
pub trait SheetSource {
    /// Read every row of `range`
    fn fetch(&self, range: &SheetRange) -> Result<Vec<Vec<String>>>;
}

impl<S: SheetSource + ?Sized> SheetSource for Box<S> {
    fn fetch(&self, range: &SheetRange) -> Result<Vec<Vec<String>>> {
        (**self).fetch(range)
    }
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Google Sheets values API client authenticated with an API key
pub struct GoogleSheetsClient {
    client: Client,
    base_url: Url,
    spreadsheet_id: String,
    api_key: String,
}

impl GoogleSheetsClient {
    /// Create a client for one spreadsheet
    pub fn new(base_url: &str, spreadsheet_id: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| CleannestError::SheetFetch(format!("base url {base_url:?}: {e}")))?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            spreadsheet_id: spreadsheet_id.to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn values_url(&self, range: &SheetRange) -> Result<Url> {
        let a1 = range.to_string();
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CleannestError::SheetFetch(format!("base url {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", a1.as_str()]);
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

impl SheetSource for GoogleSheetsClient {
    fn fetch(&self, range: &SheetRange) -> Result<Vec<Vec<String>>> {
        let url = self.values_url(range)?;
        debug!(range = %range, "Fetching sheet range");
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(CleannestError::SheetFetch(format!("{range}: HTTP {status}")));
        }
        let body: ValueRange = response.json()?;
        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }
}

/// Reads `<dir>/<sheet>.csv` exports and slices them by the A1 range
pub struct CsvSheetSource {
    dir: PathBuf,
}

impl CsvSheetSource {
    /// Source rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SheetSource for CsvSheetSource {
    fn fetch(&self, range: &SheetRange) -> Result<Vec<Vec<String>>> {
        let cells = range.cells()?;
        let path = self.dir.join(format!("{}.csv", range.sheet));
        if !path.is_file() {
            return Err(CleannestError::MissingSource(format!(
                "sheet export {} does not exist",
                path.display()
            )));
        }

        let mut csv = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)?;

        let mut rows = Vec::new();
        for (i, record) in csv.records().enumerate() {
            let row_number = i + 1;
            if row_number < cells.first_row {
                continue;
            }
            if row_number > cells.last_row {
                break;
            }
            let record = record?;
            let row: Vec<String> = (cells.first_col..=cells.last_col)
                .map(|c| record.get(c).unwrap_or_default().to_string())
                .collect();
            rows.push(row);
        }
        Ok(rows)
    }
}

/// Wraps a source with a [`RangeCache`]
pub struct CachedSheetSource<S> {
    inner: S,
    cache: RangeCache,
    namespace: String,
}

impl<S: SheetSource> CachedSheetSource<S> {
    /// Cache reads of `inner` under `namespace`, usually the spreadsheet id
    pub fn new(inner: S, cache: RangeCache, namespace: impl Into<String>) -> Self {
        Self {
            inner,
            cache,
            namespace: namespace.into(),
        }
    }
}

impl<S: SheetSource> SheetSource for CachedSheetSource<S> {
    fn fetch(&self, range: &SheetRange) -> Result<Vec<Vec<String>>> {
        if let Some(rows) = self.cache.get(&self.namespace, &range.sheet, &range.range)? {
            debug!(range = %range, "Sheet range served from cache");
            return Ok(rows);
        }
        let rows = self.inner.fetch(range)?;
        self.cache.put(&self.namespace, &range.sheet, &range.range, &rows)?;
        Ok(rows)
    }
}

/// Expense rows collected from a list of ranges
#[derive(Debug, Default)]
pub struct ExpenseRows {
    /// Rows in range order
    pub rows: Vec<RawExpense>,
    /// Ranges that produced at least one row
    pub ranges_loaded: usize,
    /// Ranges that came back empty and were skipped
    pub ranges_empty: usize,
}

/// Read every range and map rows positionally onto [`RawExpense`]
///
/// With `has_header` the first row of each range is dropped. A range with no
/// data rows is logged and skipped rather than failing the batch.
pub fn load_expense_rows(
    source: &dyn SheetSource,
    ranges: &[SheetRange],
    has_header: bool,
) -> Result<ExpenseRows> {
    let mut out = ExpenseRows::default();
    for range in ranges {
        let rows = source.fetch(range)?;
        let data = rows.get(usize::from(has_header)..).unwrap_or_default();
        if data.is_empty() {
            warn!(range = %range, "Sheet range returned no rows, skipping");
            out.ranges_empty += 1;
            continue;
        }
        out.rows.extend(data.iter().map(|row| RawExpense::from_row(row)));
        out.ranges_loaded += 1;
    }
    info!(
        rows = out.rows.len(),
        loaded = out.ranges_loaded,
        empty = out.ranges_empty,
        "Loaded expense ranges"
    );
    Ok(out)
}

/// Which backend the configuration selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// No expense source; the expenses table is left alone
    None,
    /// Google Sheets values API
    Google,
    /// Directory of per-tab CSV exports
    Csv,
}

impl FromStr for SourceKind {
    type Err = CleannestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "none" | "" => Ok(Self::None),
            "google" => Ok(Self::Google),
            "csv" => Ok(Self::Csv),
            other => Err(CleannestError::InvalidField {
                field: "sheets.source",
                value: other.to_string(),
            }),
        }
    }
}

/// Settings needed to build a source
#[derive(Debug, Clone)]
pub struct SourceSettings<'a> {
    /// Backend
    pub kind: SourceKind,
    /// Spreadsheet id (Google) and cache namespace
    pub spreadsheet_id: &'a str,
    /// API key (Google)
    pub api_key: &'a str,
    /// API base url (Google)
    pub base_url: &'a str,
    /// Export directory (CSV)
    pub csv_dir: &'a Path,
    /// Cache directory; `None` disables caching
    pub cache_dir: Option<&'a Path>,
    /// Cache time-to-live
    pub cache_ttl_secs: u64,
    /// HTTP timeout
    pub timeout: Duration,
}

/// Build the configured source, `None` when expenses are disabled
pub fn build_source(settings: &SourceSettings<'_>) -> Result<Option<Box<dyn SheetSource>>> {
    let inner: Box<dyn SheetSource> = match settings.kind {
        SourceKind::None => return Ok(None),
        SourceKind::Google => Box::new(GoogleSheetsClient::new(
            settings.base_url,
            settings.spreadsheet_id,
            settings.api_key,
            settings.timeout,
        )?),
        SourceKind::Csv => Box::new(CsvSheetSource::new(settings.csv_dir)),
    };

    let Some(cache_dir) = settings.cache_dir else {
        return Ok(Some(inner));
    };
    let cache = RangeCache::open(cache_dir, settings.cache_ttl_secs)?;
    Ok(Some(Box::new(CachedSheetSource::new(
        inner,
        cache,
        settings.spreadsheet_id,
    ))))
}
