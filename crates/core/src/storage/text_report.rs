use crate::domain::analysis::{render_value, AnalysisView, ReportSection, NOT_AVAILABLE};
use crate::time::stamp::header_timestamp;
use chrono::NaiveDateTime;
use serde_json::Value;

const HEAVY_RULE_WIDTH: usize = 60;
const LIGHT_RULE_WIDTH: usize = 40;

const DISCLAIMER: [&str; 2] = [
    "This report is for reference only and does not constitute investment advice.",
    "Investing involves risk; make decisions with caution.",
];

/// Human-readable companion of a JSON record. The layout is a stable file format: section order
/// is fixed regardless of payload key order.
pub fn render(stock_symbol: &str, generated: NaiveDateTime, results: &Value) -> String {
    let heavy = "=".repeat(HEAVY_RULE_WIDTH);
    let view = AnalysisView::new(results);
    let mut out = String::new();

    line(&mut out, &heavy);
    line(&mut out, &format!("Stock Analysis Report - {stock_symbol}"));
    line(&mut out, &format!("Generated at: {}", header_timestamp(generated)));
    line(&mut out, &heavy);
    out.push('\n');

    if let Some(decision) = view.decision() {
        heading(&mut out, "📊 Decision Summary");
        line(&mut out, &format!("Action: {}", decision.text_or_na("action")));
        line(&mut out, &format!("Confidence: {}", decision.text_or_na("confidence")));
        line(&mut out, &format!("Risk Score: {}", decision.text_or_na("risk_score")));
        line(&mut out, &format!("Target Price: {}", decision.text_or_na("target_price")));
        if let Some(reasoning) = decision.get("reasoning") {
            out.push_str("\nReasoning:\n");
            line(&mut out, &render_value(reasoning));
        }
        out.push('\n');
    }

    if let Some(state) = view.state() {
        for section in ReportSection::ALL {
            let Some(text) = state.get(section.key()) else {
                continue;
            };
            heading(&mut out, section.title());
            out.push_str(&render_value(text));
            out.push_str("\n\n");
        }
    }

    let text_or_na = |key: &str| {
        view.field(key)
            .map(render_value)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    };
    heading(&mut out, "⚙️ Analysis Configuration");
    line(&mut out, &format!("LLM Provider: {}", text_or_na("llm_provider")));
    line(&mut out, &format!("Model: {}", text_or_na("llm_model")));
    line(&mut out, &format!("Analysts: {}", view.analysts().join(", ")));
    out.push('\n');

    heading(&mut out, "⚠️ Disclaimer");
    for text in DISCLAIMER {
        line(&mut out, text);
    }

    out
}

fn line(out: &mut String, text: &str) {
    out.push_str(text);
    out.push('\n');
}

fn heading(out: &mut String, title: &str) {
    line(out, title);
    line(out, &"-".repeat(LIGHT_RULE_WIDTH));
}
