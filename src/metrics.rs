use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Ingestion counters
///
/// Every recording goes to the global `metrics` recorder (a no-op unless the
/// binary installs one) and is mirrored in the public fields so a run can
/// report its own totals.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestMetrics {
    pub rows_read_total: u64,
    pub rows_cancelled_total: u64,
    pub duplicates_removed_total: u64,
    pub rows_written_total: u64,
    pub tables_written_total: u64,
    pub sheet_ranges_loaded_total: u64,
    pub sheet_ranges_empty_total: u64,
    pub errors_total: u64,
}

impl IngestMetrics {
    /// Raw rows read from a source
    pub fn record_rows_read(&mut self, table: &str, count: usize) {
        let count = count as u64;
        self.rows_read_total += count;
        counter!("cleannest_rows_read_total", "table" => table.to_string()).increment(count);
    }

    /// Receipts dropped because they were cancelled
    pub fn record_cancelled(&mut self, count: usize) {
        let count = count as u64;
        self.rows_cancelled_total += count;
        counter!("cleannest_rows_cancelled_total").increment(count);
    }

    /// Rows removed by deduplication
    pub fn record_duplicates(&mut self, table: &str, count: usize) {
        let count = count as u64;
        self.duplicates_removed_total += count;
        counter!("cleannest_duplicates_removed_total", "table" => table.to_string()).increment(count);
    }

    /// A table replaced in the store
    pub fn record_table_written(&mut self, table: &str, rows: usize, duration: Duration) {
        let rows = rows as u64;
        self.tables_written_total += 1;
        self.rows_written_total += rows;
        counter!("cleannest_tables_written_total", "table" => table.to_string()).increment(1);
        counter!("cleannest_rows_written_total", "table" => table.to_string()).increment(rows);
        histogram!("cleannest_table_write_duration_seconds", "table" => table.to_string())
            .record(duration.as_secs_f64());
        gauge!("cleannest_table_rows", "table" => table.to_string()).set(rows as f64);
    }

    /// Outcome of reading the expense ranges
    pub fn record_sheet_ranges(&mut self, loaded: usize, empty: usize) {
        self.sheet_ranges_loaded_total += loaded as u64;
        self.sheet_ranges_empty_total += empty as u64;
        counter!("cleannest_sheet_ranges_loaded_total").increment(loaded as u64);
        counter!("cleannest_sheet_ranges_empty_total").increment(empty as u64);
    }

    /// A table that failed to load
    pub fn record_error(&mut self, table: &str, kind: &str) {
        self.errors_total += 1;
        counter!(
            "cleannest_errors_total",
            "table" => table.to_string(),
            "kind" => kind.to_string()
        )
        .increment(1);
    }

    /// One-line human summary of the run
    pub fn summary(&self) -> String {
        format!(
            "read {} rows, dropped {} cancelled, removed {} duplicates, wrote {} rows to {} tables, \
             loaded {} sheet ranges ({} empty), {} errors",
            self.rows_read_total,
            self.rows_cancelled_total,
            self.duplicates_removed_total,
            self.rows_written_total,
            self.tables_written_total,
            self.sheet_ranges_loaded_total,
            self.sheet_ranges_empty_total,
            self.errors_total,
        )
    }
}

/// Times one table write and records it on [`IngestMetrics`]
pub struct MetricsTimer {
    table: String,
    start: std::time::Instant,
}

impl MetricsTimer {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            start: std::time::Instant::now(),
        }
    }

    pub fn finish(self, metrics: &mut IngestMetrics, rows: usize) {
        metrics.record_table_written(&self.table, rows, self.start.elapsed());
    }
}
