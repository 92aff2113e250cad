use crate::core::{RateProvider, UsageHealth, UsageInfo};
use anyhow::Result;
use tracing::debug;

pub async fn build_report(provider: &dyn RateProvider) -> Result<String> {
    let usage = provider.fetch_usage_info().await?;
    debug!(?usage, "Fetched usage info");
    Ok(format_usage(&usage))
}

fn health_icon(health: UsageHealth) -> &'static str {
    match health {
        UsageHealth::Healthy => "✅",
        UsageHealth::Low => "⚠️",
        UsageHealth::Critical => "❌",
    }
}

pub fn format_usage(usage: &UsageInfo) -> String {
    let lines = [
        "Open Exchange Rates API usage".to_string(),
        String::new(),
        format!("📊 Plan: {}", usage.plan_name),
        format!("🔢 Update frequency: {}", usage.update_frequency),
        format!("📈 Request quota: {} per month", usage.requests_quota),
        format!("• Requests used: {}", usage.requests),
        format!("• Requests remaining: {}", usage.requests_remaining),
        format!("• Days elapsed: {}", usage.days_elapsed),
        format!("• Days remaining: {}", usage.days_remaining),
        format!("📅 Daily average: {} requests", usage.daily_average),
        String::new(),
        format!(
            "{} Health: {} ({:.1}% of quota remaining)",
            health_icon(usage.health()),
            usage.health(),
            usage.remaining_percent()
        ),
    ];
    lines.join("\n")
}
