//! Rendering of comparison rows as chat text or a template payload

use super::comparison::{ComparisonRow, Direction};
use super::rates::CurrencyCatalog;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;

pub const NO_DATA_MESSAGE: &str = "No valid exchange rate data found";

fn display_name(catalog: &CurrencyCatalog, code: &str) -> String {
    match catalog.name(code) {
        Some(name) => format!("{code} ({name})"),
        None => code.to_string(),
    }
}

fn format_change(row: &ComparisonRow) -> String {
    format!(
        "{:+.4} ({:+.2}%) {}",
        row.change,
        row.change_percent,
        row.direction.arrow()
    )
}

/// Renders a plain text table suitable for a chat message.
pub fn render_text(
    rows: &[ComparisonRow],
    base: &str,
    catalog: &CurrencyCatalog,
    window_days: u32,
) -> String {
    let mut out = format!(
        "📈 {} exchange rate comparison\n\n",
        display_name(catalog, base)
    );

    if rows.is_empty() {
        out.push_str(NO_DATA_MESSAGE);
        return out;
    }

    let _ = writeln!(out, "| Currency | Current | {window_days} days ago | Change |");
    out.push_str("|----------|---------|-------------|--------|\n");
    let lines: Vec<String> = rows
        .iter()
        .map(|row| {
            format!(
                "| {} | {:.4} | {:.4} | {} |",
                display_name(catalog, &row.currency_code),
                row.current_rate,
                row.historical_rate,
                format_change(row)
            )
        })
        .collect();
    out.push_str(&lines.join("\n"));
    out
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonEntry {
    pub currency_code: String,
    pub currency_name: Option<String>,
    pub current_rate: f64,
    pub historical_rate: f64,
    pub change: f64,
    pub change_percent: f64,
    pub direction: Direction,
    pub arrow: &'static str,
}

/// Data handed to an external template renderer.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonPayload {
    pub base_currency: String,
    pub base_currency_name: Option<String>,
    pub past_days: u32,
    pub comparisons: Vec<ComparisonEntry>,
    pub no_data_message: Option<String>,
    pub update_time: DateTime<Utc>,
}

pub fn render_structured(
    rows: &[ComparisonRow],
    base: &str,
    catalog: &CurrencyCatalog,
    window_days: u32,
) -> ComparisonPayload {
    let comparisons: Vec<ComparisonEntry> = rows
        .iter()
        .map(|row| ComparisonEntry {
            currency_code: row.currency_code.clone(),
            currency_name: row
                .currency_name
                .clone()
                .or_else(|| catalog.name(&row.currency_code).map(str::to_string)),
            current_rate: row.current_rate,
            historical_rate: row.historical_rate,
            change: row.change,
            change_percent: row.change_percent,
            direction: row.direction,
            arrow: row.direction.arrow(),
        })
        .collect();

    ComparisonPayload {
        base_currency: base.to_string(),
        base_currency_name: catalog.name(base).map(str::to_string),
        past_days: window_days,
        no_data_message: comparisons
            .is_empty()
            .then(|| NO_DATA_MESSAGE.to_string()),
        comparisons,
        update_time: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> CurrencyCatalog {
        [
            ("CNY".to_string(), "Chinese Yuan".to_string()),
            ("JPY".to_string(), "Japanese Yen".to_string()),
        ]
        .into_iter()
        .collect()
    }

    fn row(code: &str, current: f64, historical: f64) -> ComparisonRow {
        let change = current - historical;
        ComparisonRow {
            currency_code: code.to_string(),
            currency_name: None,
            current_rate: current,
            historical_rate: historical,
            change,
            change_percent: change / historical * 100.0,
            direction: Direction::from_change(change),
        }
    }

    #[test]
    fn test_render_text_table() {
        let rows = vec![row("JPY", 150.0, 140.0), row("EUR", 0.9, 0.95)];

        let text = render_text(&rows, "CNY", &catalog(), 7);

        assert!(text.starts_with("📈 CNY (Chinese Yuan) exchange rate comparison"));
        assert!(text.contains("| Currency | Current | 7 days ago | Change |"));
        assert!(text.contains("| JPY (Japanese Yen) | 150.0000 | 140.0000 | +10.0000 (+7.14%) ↑ |"));
        assert!(text.contains("| EUR | 0.9000 | 0.9500 | -0.0500 (-5.26%) ↓ |"));
        assert!(!text.contains(NO_DATA_MESSAGE));
    }

    #[test]
    fn test_render_text_without_rows() {
        let text = render_text(&[], "XYZ", &catalog(), 7);

        assert!(text.starts_with("📈 XYZ exchange rate comparison"));
        assert!(text.ends_with(NO_DATA_MESSAGE));
        assert!(!text.contains("| Currency |"));
    }

    #[test]
    fn test_render_structured() {
        let rows = vec![row("JPY", 150.0, 150.0)];

        let payload = render_structured(&rows, "CNY", &catalog(), 30);

        assert_eq!(payload.base_currency, "CNY");
        assert_eq!(payload.base_currency_name.as_deref(), Some("Chinese Yuan"));
        assert_eq!(payload.past_days, 30);
        assert!(payload.no_data_message.is_none());
        assert_eq!(payload.comparisons.len(), 1);
        let entry = &payload.comparisons[0];
        assert_eq!(entry.currency_name.as_deref(), Some("Japanese Yen"));
        assert_eq!(entry.direction, Direction::Flat);
        assert_eq!(entry.arrow, "→");

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["comparisons"][0]["direction"], "flat");
        assert_eq!(json["comparisons"][0]["currency_code"], "JPY");
    }

    #[test]
    fn test_render_structured_without_rows() {
        let payload = render_structured(&[], "CNY", &catalog(), 7);

        assert!(payload.comparisons.is_empty());
        assert_eq!(payload.no_data_message.as_deref(), Some(NO_DATA_MESSAGE));
    }
}
