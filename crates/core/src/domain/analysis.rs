//! Read-only accessors over an analysis result payload.
//!
//! The payload is produced by the analysis pipeline and stored verbatim, so it stays a
//! `serde_json::Value`. Every field is optional; callers substitute [`NOT_AVAILABLE`].

use serde_json::{Map, Value};

pub const NOT_AVAILABLE: &str = "N/A";

/// Free-text sections an analysis may carry under `state`, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportSection {
    Market,
    Fundamentals,
    Sentiment,
    News,
    RiskAssessment,
    InvestmentPlan,
}

impl ReportSection {
    pub const ALL: [ReportSection; 6] = [
        ReportSection::Market,
        ReportSection::Fundamentals,
        ReportSection::Sentiment,
        ReportSection::News,
        ReportSection::RiskAssessment,
        ReportSection::InvestmentPlan,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ReportSection::Market => "market_report",
            ReportSection::Fundamentals => "fundamentals_report",
            ReportSection::Sentiment => "sentiment_report",
            ReportSection::News => "news_report",
            ReportSection::RiskAssessment => "risk_assessment",
            ReportSection::InvestmentPlan => "investment_plan",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ReportSection::Market => "📈 Market Technical Analysis",
            ReportSection::Fundamentals => "💰 Fundamentals Analysis",
            ReportSection::Sentiment => "💭 Market Sentiment Analysis",
            ReportSection::News => "📰 News Analysis",
            ReportSection::RiskAssessment => "⚠️ Risk Assessment",
            ReportSection::InvestmentPlan => "📋 Investment Plan",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AnalysisView<'a> {
    results: &'a Value,
}

impl<'a> AnalysisView<'a> {
    pub fn new(results: &'a Value) -> Self {
        Self { results }
    }

    /// `None` when the payload has no `decision` key. A non-object decision reads as empty.
    pub fn decision(&self) -> Option<Section<'a>> {
        self.results.get("decision").map(Section::from_value)
    }

    pub fn state(&self) -> Option<Section<'a>> {
        self.results.get("state").map(Section::from_value)
    }

    pub fn field(&self, key: &str) -> Option<&'a Value> {
        present(self.results.get(key))
    }

    /// Decision field for listings; missing decision or field gives `"N/A"`.
    pub fn decision_field(&self, key: &str) -> Value {
        self.decision()
            .and_then(|d| d.get(key))
            .cloned()
            .unwrap_or_else(|| Value::String(NOT_AVAILABLE.to_string()))
    }

    pub fn analysts(&self) -> Vec<String> {
        match self.field("analysts") {
            Some(Value::Array(items)) => items.iter().map(render_value).collect(),
            Some(other) => vec![render_value(other)],
            None => Vec::new(),
        }
    }
}

/// A sub-mapping of the payload such as `decision` or `state`.
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    map: Option<&'a Map<String, Value>>,
}

impl<'a> Section<'a> {
    fn from_value(value: &'a Value) -> Self {
        Self {
            map: value.as_object(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        present(self.map.and_then(|m| m.get(key)))
    }

    pub fn text_or_na(&self, key: &str) -> String {
        self.get(key)
            .map(render_value)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// Text form of a payload value: strings verbatim, everything else as JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => NOT_AVAILABLE.to_string(),
        other => other.to_string(),
    }
}
