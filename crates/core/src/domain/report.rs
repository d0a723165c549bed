use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub stock_symbol: String,
    pub analysis_date: String,
    pub generated_at: String,
    pub filename: String,
}

/// On-disk shape of `<id>_report.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReport {
    pub metadata: ReportMetadata,
    pub results: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub action: Value,
    pub confidence: Value,
    pub target_price: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportListing {
    pub filename: String,
    pub filepath: PathBuf,
    pub metadata: ReportMetadata,
    pub summary: ReportSummary,
}

/// Derived on demand from the reports directory, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockIndexEntry {
    pub symbol: String,
    pub report_count: usize,
}
