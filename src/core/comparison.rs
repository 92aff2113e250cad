//! Rate comparison between a current and a historical snapshot

use super::rates::{CurrencyCatalog, RateSnapshot};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl Direction {
    /// Strictly sign based; only an exact zero is flat.
    pub fn from_change(change: f64) -> Self {
        if change > 0.0 {
            Direction::Up
        } else if change < 0.0 {
            Direction::Down
        } else {
            Direction::Flat
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Direction::Up => "↑",
            Direction::Down => "↓",
            Direction::Flat => "→",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Direction::Up => "up",
                Direction::Down => "down",
                Direction::Flat => "flat",
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub currency_code: String,
    pub currency_name: Option<String>,
    pub current_rate: f64,
    pub historical_rate: f64,
    pub change: f64,
    pub change_percent: f64,
    pub direction: Direction,
}

/// Builds one row per target with usable data on both sides, in target order.
///
/// A target missing from either snapshot, or carrying a zero rate, is
/// skipped. Duplicate targets produce duplicate rows.
pub fn compare(
    catalog: &CurrencyCatalog,
    base: &str,
    current: &RateSnapshot,
    historical: &RateSnapshot,
    targets: &[String],
) -> Vec<ComparisonRow> {
    if current.base() != base || historical.base() != base {
        warn!(
            base,
            current_base = current.base(),
            historical_base = historical.base(),
            "Snapshot base does not match requested base"
        );
    }

    targets
        .iter()
        .filter_map(|code| {
            let (current_rate, historical_rate) =
                match (current.get(code), historical.get(code)) {
                    (Some(c), Some(h)) if c != 0.0 && h != 0.0 => (c, h),
                    _ => {
                        debug!(currency = %code, "Skipping currency without data on both dates");
                        return None;
                    }
                };

            let change = current_rate - historical_rate;
            Some(ComparisonRow {
                currency_code: code.clone(),
                currency_name: catalog.name(code).map(str::to_string),
                current_rate,
                historical_rate,
                change,
                change_percent: change / historical_rate * 100.0,
                direction: Direction::from_change(change),
            })
        })
        .collect()
}
