use crate::domain::analysis::render_value;
use crate::domain::report::ReportListing;
use crate::time::stamp::parse_generated_at;
use serde_json::Value;

const PENDING: &str = "Pending";

/// Six-digit numeric codes are mainland China A-shares (priced in CNY).
pub fn is_a_share(symbol: &str) -> bool {
    let symbol = symbol.trim();
    symbol.len() == 6 && symbol.bytes().all(|b| b.is_ascii_digit())
}

pub fn format_confidence(value: &Value) -> String {
    match value.as_f64() {
        Some(c) => format!("{:.1}%", c * 100.0),
        None => render_value(value),
    }
}

pub fn format_target_price(symbol: &str, value: &Value) -> String {
    match value.as_f64().filter(|p| *p != 0.0) {
        Some(price) => {
            let currency = if is_a_share(symbol) { "¥" } else { "$" };
            format!("{currency}{price:.2}")
        }
        None => PENDING.to_string(),
    }
}

/// One-line description of a stored report for pickers and terminal listings.
pub fn listing_label(listing: &ReportListing) -> String {
    let metadata = &listing.metadata;
    let generated = parse_generated_at(&metadata.generated_at)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| metadata.generated_at.clone());

    format!(
        "{generated} | Analysis date: {} | Action: {} | Confidence: {}",
        metadata.analysis_date,
        render_value(&listing.summary.action),
        format_confidence(&listing.summary.confidence),
    )
}
