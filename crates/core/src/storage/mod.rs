pub mod error;
pub mod reports;
pub mod text_report;

use crate::domain::report::{ReportListing, StockIndexEntry, StoredReport};
use error::ReportStoreError;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub type StoreResult<T> = Result<T, ReportStoreError>;

/// Persistence for analysis reports.
///
/// Listings are best-effort: a missing directory is an empty result and unreadable records are
/// skipped. Single-record calls propagate every failure except a missing file on `delete`.
pub trait ReportRepository: Send + Sync {
    /// Stores one analysis and returns the absolute path of its JSON record.
    fn save(&self, stock_symbol: &str, analysis_date: &str, results: &Value)
        -> StoreResult<PathBuf>;

    /// Symbols with at least one report, most reports first.
    fn list_stocks(&self) -> StoreResult<Vec<StockIndexEntry>>;

    /// Reports for one symbol, newest first.
    fn list_reports(&self, stock_symbol: &str) -> StoreResult<Vec<ReportListing>>;

    fn load(&self, path: &Path) -> StoreResult<StoredReport>;

    /// Removes the JSON record and its text companion. Missing files are not an error.
    fn delete(&self, path: &Path) -> StoreResult<()>;

    /// Resolves a record from its symbol and file name, rejecting anything outside the store.
    fn report_path(&self, stock_symbol: &str, filename: &str) -> StoreResult<PathBuf>;

    /// Reads the text companion of a JSON record.
    fn load_text(&self, path: &Path) -> StoreResult<String>;
}
