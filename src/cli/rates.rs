use super::ui;
use crate::core::config::OutputFormat;
use crate::core::query::RateQuery;
use crate::core::report::{NO_DATA_MESSAGE, render_structured, render_text};
use crate::core::{ComparisonRow, CurrencyCatalog, RateProvider, compare};
use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use comfy_table::Cell;
use tracing::{debug, info};

/// Fetches the current and historical snapshots for `query` and renders the
/// comparison in the requested format.
pub async fn build_report(
    provider: &dyn RateProvider,
    query: &RateQuery,
    past_days: u32,
    format: OutputFormat,
    today: NaiveDate,
) -> Result<String> {
    let historical_date = today
        .checked_sub_days(Days::new(u64::from(past_days)))
        .with_context(|| format!("Invalid comparison window: {past_days} days"))?;
    info!(
        base = %query.base,
        targets = ?query.targets,
        %historical_date,
        "Querying exchange rates"
    );

    let pb = ui::new_spinner("Fetching exchange rates");
    let fetched = futures::try_join!(
        provider.fetch_currencies(),
        provider.fetch_latest_rates(&query.base),
        provider.fetch_historical_rates(historical_date, &query.base),
    );
    pb.finish_and_clear();
    let (catalog, current, historical) = fetched?;
    debug!(
        current = current.len(),
        historical = historical.len(),
        "Fetched snapshots"
    );

    let rows = compare(&catalog, &query.base, &current, &historical, &query.targets);

    let output = match format {
        OutputFormat::Text => render_text(&rows, &query.base, &catalog, past_days),
        OutputFormat::Table => render_table(&rows, &query.base, &catalog, past_days),
        OutputFormat::Json => {
            let payload = render_structured(&rows, &query.base, &catalog, past_days);
            serde_json::to_string_pretty(&payload).context("Failed to serialize report")?
        }
    };
    Ok(output)
}

fn render_table(
    rows: &[ComparisonRow],
    base: &str,
    catalog: &CurrencyCatalog,
    past_days: u32,
) -> String {
    let title = match catalog.name(base) {
        Some(name) => format!("Base: {base} ({name})"),
        None => format!("Base: {base}"),
    };
    let title = ui::style_text(&title, ui::StyleType::Title);

    if rows.is_empty() {
        return format!(
            "{title}\n{}",
            ui::style_text(NO_DATA_MESSAGE, ui::StyleType::Subtle)
        );
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell("Name"),
        ui::header_cell("Current"),
        ui::header_cell(&format!("{past_days}D ago")),
        ui::header_cell("Change"),
        ui::header_cell("Change %"),
    ]);

    for row in rows {
        let name = row
            .currency_name
            .as_deref()
            .or_else(|| catalog.name(&row.currency_code))
            .unwrap_or("");
        table.add_row(vec![
            Cell::new(&row.currency_code),
            Cell::new(name),
            ui::rate_cell(row.current_rate),
            ui::rate_cell(row.historical_rate),
            ui::change_cell(
                format!("{:+.4} {}", row.change, row.direction.arrow()),
                row.direction,
            ),
            ui::change_cell(format!("{:+.2}%", row.change_percent), row.direction),
        ]);
    }

    format!("{title}\n{table}")
}
