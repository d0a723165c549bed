//! Filesystem-backed report store.
//!
//! Layout (a compatibility contract with existing archives):
//!
//! ```text
//! <root>/<SYMBOL>/<YYYYMMDD_HHMMSS>_report.json
//! <root>/<SYMBOL>/<YYYYMMDD_HHMMSS>_report.txt
//! ```
//!
//! Nothing is cached; every call re-reads the directory tree.

use crate::domain::analysis::AnalysisView;
use crate::domain::report::{
    ReportListing, ReportMetadata, ReportSummary, StockIndexEntry, StoredReport,
};
use crate::storage::error::ReportStoreError;
use crate::storage::{text_report, ReportRepository, StoreResult};
use crate::time::stamp;
use chrono::NaiveDateTime;
use serde_json::Value;
use std::cmp::Reverse;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const REPORT_SUFFIX: &str = "_report.json";
const TEXT_EXTENSION: &str = "txt";

#[derive(Debug, Clone)]
pub struct FsReportStore {
    root: PathBuf,
}

impl FsReportStore {
    /// The root does not have to exist yet; it is created on first save.
    pub fn new(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref();
        let root = std::path::absolute(root).map_err(|e| ReportStoreError::io(root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `save` with an explicit creation instant.
    pub fn save_at(
        &self,
        stock_symbol: &str,
        analysis_date: &str,
        results: &Value,
        now: NaiveDateTime,
    ) -> StoreResult<PathBuf> {
        let symbol = normalize_symbol(stock_symbol)?;
        let stock_dir = self.root.join(&symbol);
        fs::create_dir_all(&stock_dir).map_err(|e| ReportStoreError::io(&stock_dir, e))?;

        let report_id = stamp::report_id(now);
        let filename = format!("{report_id}{REPORT_SUFFIX}");
        let json_path = stock_dir.join(&filename);

        let report = StoredReport {
            metadata: ReportMetadata {
                stock_symbol: symbol.clone(),
                analysis_date: analysis_date.to_string(),
                generated_at: stamp::generated_at(now),
                filename,
            },
            results: results.clone(),
        };
        let body = serde_json::to_string_pretty(&report).map_err(|e| ReportStoreError::Parse {
            path: json_path.clone(),
            source: e,
        })?;
        fs::write(&json_path, body).map_err(|e| ReportStoreError::io(&json_path, e))?;

        let text_path = json_path.with_extension(TEXT_EXTENSION);
        let text = text_report::render(stock_symbol.trim(), now, results);
        fs::write(&text_path, text).map_err(|e| ReportStoreError::io(&text_path, e))?;

        tracing::info!(
            %symbol,
            path = %json_path.display(),
            "analysis report saved"
        );
        Ok(json_path)
    }

    fn read_listing(path: &Path) -> StoreResult<ReportListing> {
        let report = read_report(path)?;
        let view = AnalysisView::new(&report.results);
        let summary = ReportSummary {
            action: view.decision_field("action"),
            confidence: view.decision_field("confidence"),
            target_price: view.decision_field("target_price"),
        };

        Ok(ReportListing {
            filename: file_name(path),
            filepath: path.to_path_buf(),
            metadata: report.metadata,
            summary,
        })
    }
}

impl ReportRepository for FsReportStore {
    fn save(
        &self,
        stock_symbol: &str,
        analysis_date: &str,
        results: &Value,
    ) -> StoreResult<PathBuf> {
        self.save_at(stock_symbol, analysis_date, results, stamp::now_local())
    }

    fn list_stocks(&self) -> StoreResult<Vec<StockIndexEntry>> {
        let Some(entries) = read_dir_if_exists(&self.root)? else {
            return Ok(Vec::new());
        };

        let mut stocks = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let report_count = match report_files(&path) {
                Ok(files) => files.len(),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable stock directory");
                    continue;
                }
            };
            if report_count > 0 {
                stocks.push(StockIndexEntry {
                    symbol: file_name(&path),
                    report_count,
                });
            }
        }

        stocks.sort_by(|a, b| {
            b.report_count
                .cmp(&a.report_count)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        tracing::debug!(stocks = stocks.len(), "listed stocks");
        Ok(stocks)
    }

    fn list_reports(&self, stock_symbol: &str) -> StoreResult<Vec<ReportListing>> {
        let symbol = normalize_symbol(stock_symbol)?;
        let stock_dir = self.root.join(&symbol);

        let files = match report_files(&stock_dir) {
            Ok(files) => files,
            Err(ReportStoreError::NotFound { .. }) => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };

        let mut reports = Vec::with_capacity(files.len());
        for path in files {
            match Self::read_listing(&path) {
                Ok(listing) => reports.push(listing),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable report");
                }
            }
        }

        reports.sort_by_key(|r| Reverse(r.metadata.generated_at.clone()));
        tracing::debug!(%symbol, reports = reports.len(), "listed reports");
        Ok(reports)
    }

    fn load(&self, path: &Path) -> StoreResult<StoredReport> {
        read_report(path)
    }

    fn delete(&self, path: &Path) -> StoreResult<()> {
        let text_path = path.with_extension(TEXT_EXTENSION);
        let removed_json = remove_if_exists(path)?;
        let removed_text = remove_if_exists(&text_path)?;

        tracing::info!(
            path = %path.display(),
            removed_json,
            removed_text,
            "analysis report deleted"
        );
        Ok(())
    }

    fn report_path(&self, stock_symbol: &str, filename: &str) -> StoreResult<PathBuf> {
        let symbol = normalize_symbol(stock_symbol)?;
        let valid = filename.len() > REPORT_SUFFIX.len()
            && filename.ends_with(REPORT_SUFFIX)
            && !filename.contains(['/', '\\'])
            && !filename.contains("..");
        if !valid {
            return Err(ReportStoreError::InvalidFilename(filename.to_string()));
        }
        Ok(self.root.join(symbol).join(filename))
    }

    fn load_text(&self, path: &Path) -> StoreResult<String> {
        let text_path = path.with_extension(TEXT_EXTENSION);
        fs::read_to_string(&text_path).map_err(|e| ReportStoreError::io(&text_path, e))
    }
}

/// Uppercases a symbol and rejects anything that could escape its directory.
fn normalize_symbol(stock_symbol: &str) -> StoreResult<String> {
    let symbol = stock_symbol.trim().to_uppercase();
    let valid = !symbol.is_empty()
        && !symbol.contains(['/', '\\', '\0'])
        && !symbol.contains("..")
        && symbol != ".";
    if !valid {
        return Err(ReportStoreError::InvalidSymbol(stock_symbol.to_string()));
    }
    Ok(symbol)
}

fn read_report(path: &Path) -> StoreResult<StoredReport> {
    let body = fs::read_to_string(path).map_err(|e| ReportStoreError::io(path, e))?;
    serde_json::from_str(&body).map_err(|e| ReportStoreError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

fn read_dir_if_exists(dir: &Path) -> StoreResult<Option<fs::ReadDir>> {
    match fs::read_dir(dir) {
        Ok(entries) => Ok(Some(entries)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ReportStoreError::io(dir, e)),
    }
}

/// JSON records directly inside a stock directory.
fn report_files(stock_dir: &Path) -> StoreResult<Vec<PathBuf>> {
    let entries = fs::read_dir(stock_dir).map_err(|e| ReportStoreError::io(stock_dir, e))?;
    Ok(entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && file_name(path).ends_with(REPORT_SUFFIX))
        .collect())
}

fn remove_if_exists(path: &Path) -> StoreResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(ReportStoreError::io(path, e)),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn store() -> (tempfile::TempDir, FsReportStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsReportStore::new(dir.path().join("reports")).unwrap();
        (dir, store)
    }

    fn sample_results() -> Value {
        json!({
            "decision": {
                "action": "BUY",
                "confidence": 0.82,
                "risk_score": 0.35,
                "target_price": 210.5,
                "reasoning": "营收增长强劲"
            },
            "state": {
                "market_report": "Uptrend above the 50-day average.",
                "news_report": "No material news."
            },
            "llm_provider": "google",
            "llm_model": "gemini-2.0-flash",
            "analysts": ["market", "news"]
        })
    }

    #[test]
    fn save_then_load_round_trips_results() {
        let (_dir, store) = store();
        let results = sample_results();

        let path = store
            .save_at("aapl", "2026-01-02", &results, at(9, 7, 3))
            .unwrap();
        assert!(path.is_absolute());
        assert_eq!(path, store.root().join("AAPL").join("20260105_090703_report.json"));
        assert!(path.with_extension("txt").is_file());

        let loaded = store.load(&path).unwrap();
        assert_eq!(loaded.results, results);
        assert_eq!(loaded.metadata.stock_symbol, "AAPL");
        assert_eq!(loaded.metadata.analysis_date, "2026-01-02");
        assert_eq!(loaded.metadata.generated_at, "2026-01-05T09:07:03.000000");
        assert_eq!(loaded.metadata.filename, "20260105_090703_report.json");
    }

    #[test]
    fn json_is_indented_and_keeps_unicode() {
        let (_dir, store) = store();
        let path = store
            .save_at("AAPL", "2026-01-02", &sample_results(), at(9, 7, 3))
            .unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("{\n  \"metadata\": {\n    \"stock_symbol\": \"AAPL\""));
        assert!(raw.contains("营收增长强劲"));
    }

    #[test]
    fn text_report_is_written_alongside() {
        let (_dir, store) = store();
        let path = store.save_at("aapl", "2026-01-02", &json!({}), at(9, 7, 3)).unwrap();

        let text = store.load_text(&path).unwrap();
        assert!(text.contains("Stock Analysis Report - aapl\n"));
        assert!(text.contains("LLM Provider: N/A\nModel: N/A\nAnalysts: \n"));
        assert!(!text.contains("Decision Summary"));
    }

    #[test]
    fn same_second_save_overwrites() {
        let (_dir, store) = store();
        let first = store
            .save_at("AAPL", "2026-01-01", &json!({"n": 1}), at(9, 0, 0))
            .unwrap();
        let second = store
            .save_at("AAPL", "2026-01-02", &json!({"n": 2}), at(9, 0, 0))
            .unwrap();

        assert_eq!(first, second);
        let reports = store.list_reports("AAPL").unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(store.load(&second).unwrap().results, json!({"n": 2}));
    }

    #[test]
    fn delete_is_idempotent() {
        let (_dir, store) = store();
        let path = store
            .save_at("AAPL", "2026-01-02", &sample_results(), at(9, 7, 3))
            .unwrap();

        store.delete(&path).unwrap();
        assert!(!path.exists());
        assert!(!path.with_extension("txt").exists());

        store.delete(&path).unwrap();
    }

    #[test]
    fn delete_tolerates_half_removed_pair() {
        let (_dir, store) = store();
        let path = store
            .save_at("AAPL", "2026-01-02", &sample_results(), at(9, 7, 3))
            .unwrap();
        fs::remove_file(&path).unwrap();

        store.delete(&path).unwrap();
        assert!(!path.with_extension("txt").exists());
    }

    #[test]
    fn listing_skips_corrupt_records() {
        let (_dir, store) = store();
        for s in 1..=3 {
            store
                .save_at("MSFT", "2026-01-02", &sample_results(), at(10, 0, s))
                .unwrap();
        }
        let stock_dir = store.root().join("MSFT");
        fs::write(stock_dir.join("20260105_110000_report.json"), "{\"metadata\": {").unwrap();
        fs::write(stock_dir.join("20260105_120000_report.json"), "{\"results\": {}}").unwrap();

        let reports = store.list_reports("msft").unwrap();
        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|r| r.summary.action == json!("BUY")));
    }

    #[test]
    fn listing_is_newest_first() {
        let (_dir, store) = store();
        let t1 = store.save_at("TSLA", "d1", &json!({}), at(8, 0, 0)).unwrap();
        let t3 = store.save_at("TSLA", "d3", &json!({}), at(18, 0, 0)).unwrap();
        let t2 = store.save_at("TSLA", "d2", &json!({}), at(12, 30, 0)).unwrap();

        let paths: Vec<_> = store
            .list_reports("TSLA")
            .unwrap()
            .into_iter()
            .map(|r| r.filepath)
            .collect();
        assert_eq!(paths, vec![t3, t2, t1]);
    }

    #[test]
    fn listing_summary_defaults_to_na() {
        let (_dir, store) = store();
        store
            .save_at("NVDA", "2026-01-02", &json!({"decision": {"action": "HOLD"}}), at(9, 0, 0))
            .unwrap();

        let reports = store.list_reports("NVDA").unwrap();
        assert_eq!(reports.len(), 1);
        let summary = &reports[0].summary;
        assert_eq!(summary.action, json!("HOLD"));
        assert_eq!(summary.confidence, json!("N/A"));
        assert_eq!(summary.target_price, json!("N/A"));
        assert_eq!(reports[0].filename, "20260105_090000_report.json");
    }

    #[test]
    fn unknown_symbol_lists_nothing() {
        let (_dir, store) = store();
        assert!(store.list_reports("NONEXISTENT").unwrap().is_empty());
        assert!(store.list_stocks().unwrap().is_empty());
    }

    #[test]
    fn stock_index_counts_and_orders() {
        let (_dir, store) = store();
        store.save_at("MSFT", "d", &json!({}), at(9, 0, 0)).unwrap();
        for (i, symbol) in ["TSLA", "AAPL"].iter().enumerate() {
            store.save_at(symbol, "d", &json!({}), at(9, 0, i as u32)).unwrap();
            store.save_at(symbol, "d", &json!({}), at(10, 0, i as u32)).unwrap();
        }

        fs::create_dir_all(store.root().join("EMPTY")).unwrap();
        let text_only = store.root().join("TEXTONLY");
        fs::create_dir_all(&text_only).unwrap();
        fs::write(text_only.join("20260105_090000_report.txt"), "orphan").unwrap();
        fs::write(store.root().join("stray.json"), "{}").unwrap();

        let stocks = store.list_stocks().unwrap();
        assert_eq!(
            stocks,
            vec![
                StockIndexEntry { symbol: "AAPL".to_string(), report_count: 2 },
                StockIndexEntry { symbol: "TSLA".to_string(), report_count: 2 },
                StockIndexEntry { symbol: "MSFT".to_string(), report_count: 1 },
            ]
        );
    }

    #[test]
    fn load_reports_missing_and_corrupt_files() {
        let (_dir, store) = store();
        let missing = store.root().join("AAPL").join("20260105_090000_report.json");
        assert!(store.load(&missing).unwrap_err().is_not_found());

        fs::create_dir_all(missing.parent().unwrap()).unwrap();
        fs::write(&missing, "not json").unwrap();
        assert!(matches!(
            store.load(&missing),
            Err(ReportStoreError::Parse { .. })
        ));
    }

    #[test]
    fn rejects_symbols_that_escape_the_root() {
        let (_dir, store) = store();
        for bad in ["", "   ", "../etc", "a/b", "..", "."] {
            let err = store.save_at(bad, "d", &json!({}), at(9, 0, 0)).unwrap_err();
            assert!(err.is_invalid_input(), "{bad:?} accepted");
        }
        assert!(store.list_reports("../x").unwrap_err().is_invalid_input());
    }

    #[test]
    fn report_path_validates_filename() {
        let (_dir, store) = store();
        let ok = store.report_path("aapl", "20260105_090000_report.json").unwrap();
        assert_eq!(ok, store.root().join("AAPL").join("20260105_090000_report.json"));

        for bad in ["_report.json", "x.json", "../20260105_090000_report.json", "a\\b_report.json"] {
            assert!(store.report_path("AAPL", bad).unwrap_err().is_invalid_input());
        }
    }
}
