//! Ingestion run: read every source, build each table in memory, then
//! replace it in the store.
//!
//! Tables are written in a fixed order (customers, receipts, expenses,
//! items). A failure stops the run at that table; tables already written stay
//! written.

use std::path::Path;

use chrono::{Datelike, NaiveDateTime};
use tracing::{error, info, warn};

use crate::catalog;
use crate::config::AppConfig;
use crate::db::Database;
use crate::error::{CleannestError, Result};
use crate::extract::{ReceiptExtractor, CANCELLED_STATUS};
use crate::logging::StageTimer;
use crate::metrics::{IngestMetrics, MetricsTimer};
use crate::models::{Customer, Expense, Receipt};
use crate::normalize::{normalize_customers, normalize_expenses, normalize_receipts};
use crate::readers::{load_holidays, read_customer_dir, read_receipt_dir};
use crate::schema;
use crate::sheets::{load_expense_rows, SheetSource};

/// Rows written per table by one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Customers written
    pub customers: usize,
    /// Receipts written
    pub receipts: usize,
    /// Expenses written; `None` when no expense source produced rows
    pub expenses: Option<usize>,
    /// Catalog items written
    pub items: usize,
    /// Holidays found for the current year; `None` when the file is absent
    pub holidays: Option<usize>,
}

/// One ingestion run over the configured sources
pub struct IngestPipeline<'a> {
    config: &'a AppConfig,
    extractor: ReceiptExtractor,
    metrics: IngestMetrics,
    now: NaiveDateTime,
}

impl<'a> IngestPipeline<'a> {
    /// Prepare a run; `now` stamps the catalog rows
    pub fn new(config: &'a AppConfig, now: NaiveDateTime) -> Result<Self> {
        Ok(Self {
            config,
            extractor: ReceiptExtractor::new(&config.receipts.cashiers)?,
            metrics: IngestMetrics::default(),
            now,
        })
    }

    /// Counters gathered so far
    #[must_use]
    pub fn metrics(&self) -> &IngestMetrics {
        &self.metrics
    }

    /// Read, normalize and deduplicate the customer exports
    pub fn load_customers(&mut self) -> Result<Vec<Customer>> {
        let mut timer = StageTimer::start("load_customers");
        let raws = read_customer_dir(Path::new(&self.config.data.customers_dir))?;
        self.metrics.record_rows_read(schema::customers::TABLE, raws.len());
        let (customers, removed) = normalize_customers(raws);
        self.metrics.record_duplicates(schema::customers::TABLE, removed);
        timer.set_rows(customers.len());
        Ok(customers)
    }

    /// Read the receipt exports, extract features, deduplicate and sort
    pub fn load_receipts(&mut self) -> Result<Vec<Receipt>> {
        let mut timer = StageTimer::start("load_receipts");
        let raws = read_receipt_dir(Path::new(&self.config.data.receipts_dir))?;
        self.metrics.record_rows_read(schema::receipts::TABLE, raws.len());
        let cancelled = raws.iter().filter(|r| r.status == CANCELLED_STATUS).count();
        self.metrics.record_cancelled(cancelled);

        let receipts = self.extractor.extract_all(raws)?;
        let (receipts, removed) = normalize_receipts(receipts);
        self.metrics.record_duplicates(schema::receipts::TABLE, removed);
        timer.set_rows(receipts.len());
        Ok(receipts)
    }

    /// Read the configured expense ranges; `None` when none returned rows
    pub fn load_expenses(&mut self, source: &dyn SheetSource) -> Result<Option<Vec<Expense>>> {
        let _timer = StageTimer::start("load_expenses");
        let batch = load_expense_rows(source, &self.config.sheets.ranges, self.config.sheets.has_header)?;
        self.metrics
            .record_sheet_ranges(batch.ranges_loaded, batch.ranges_empty);
        if batch.ranges_loaded == 0 {
            warn!("No expense range returned rows, leaving the expenses table untouched");
            return Ok(None);
        }
        self.metrics.record_rows_read(schema::expenses::TABLE, batch.rows.len());
        normalize_expenses(batch.rows).map(Some)
    }

    fn step<T>(&mut self, table: &str, result: Result<T>) -> Result<T> {
        result.map_err(|e| {
            error!(table, kind = e.kind(), error = %e, "Table load failed, aborting run");
            self.metrics.record_error(table, e.kind());
            e
        })
    }

    /// Run every step against `db`
    ///
    /// `source` is the expense spreadsheet; with `None` the expenses table is
    /// not touched.
    pub fn run(&mut self, db: &mut Database, source: Option<&dyn SheetSource>) -> Result<IngestReport> {
        let timer = StageTimer::start("ingest");
        let mut report = IngestReport::default();

        let loaded = self.load_customers();
        let customers = self.step(schema::customers::TABLE, loaded)?;
        let write = MetricsTimer::new(schema::customers::TABLE);
        let written = db.replace_customers(&customers);
        report.customers = self.step(schema::customers::TABLE, written)?;
        write.finish(&mut self.metrics, report.customers);

        let loaded = self.load_receipts();
        let receipts = self.step(schema::receipts::TABLE, loaded)?;
        let write = MetricsTimer::new(schema::receipts::TABLE);
        let written = db.replace_receipts(&receipts);
        report.receipts = self.step(schema::receipts::TABLE, written)?;
        write.finish(&mut self.metrics, report.receipts);

        if let Some(source) = source {
            let loaded = self.load_expenses(source);
            if let Some(expenses) = self.step(schema::expenses::TABLE, loaded)? {
                let write = MetricsTimer::new(schema::expenses::TABLE);
                let written = db.replace_expenses(&expenses);
                let n = self.step(schema::expenses::TABLE, written)?;
                write.finish(&mut self.metrics, n);
                report.expenses = Some(n);
            }
        } else {
            info!("No expense source configured");
        }

        let items = catalog::default_items(self.now);
        let write = MetricsTimer::new(schema::items::TABLE);
        let written = db.replace_items(&items);
        report.items = self.step(schema::items::TABLE, written)?;
        write.finish(&mut self.metrics, report.items);

        let year = self.now.year();
        report.holidays = match load_holidays(Path::new(&self.config.data.holidays_dir), year) {
            Ok(holidays) => {
                info!(year, count = holidays.len(), "Loaded holidays");
                Some(holidays.len())
            }
            Err(CleannestError::MissingSource(msg)) => {
                warn!(year, "{msg}");
                None
            }
            Err(e) => return Err(e),
        };

        timer.finish();
        info!(summary = %self.metrics.summary(), "Ingestion finished");
        Ok(report)
    }
}
