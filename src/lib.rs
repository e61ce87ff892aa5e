//! Cleannest - Laundry Point-of-Sale Analytics
//!
//! A Rust library for ingesting a laundry shop's point-of-sale exports and
//! expense spreadsheet into a SQLite store, and computing revenue, retention
//! and client-value analytics over it.
//!
//! # Features
//!
//! - Receipt feature extraction from free-text item descriptions
//! - Deduplicating, fully-replacing table loads
//! - Expense ranges from Google Sheets or CSV exports, with an on-disk cache
//! - Churn, cohort, lifetime-value and cash-flow analytics
//! - Session order entry against the item catalog

/// Item catalog seed list
pub mod catalog;
/// On-disk cache for spreadsheet range reads
pub mod cache;
/// Per-client lifetime value
pub mod clients;
/// Configuration management
pub mod config;
/// SQLite store
pub mod db;
/// Error types
pub mod error;
/// Receipt feature extraction
pub mod extract;
/// Expense totals and cash flow
pub mod finance;
/// Ingestion pipeline
pub mod ingest;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Deduplication and type coercion
pub mod normalize;
/// Session order entry
pub mod order;
/// Point-of-sale CSV readers
pub mod readers;
/// Report rendering
pub mod report;
/// Churn and cohort retention
pub mod retention;
/// Database schema definitions
pub mod schema;
/// Spreadsheet range sources
pub mod sheets;
/// Revenue, load and customer statistics
pub mod stats;
/// Shared helpers
pub mod utils;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use db::Database;
pub use error::{CleannestError, Result};
pub use models::{Customer, DateRange, Expense, Item, OutputFormat, Receipt};
pub use stats::Stats;
