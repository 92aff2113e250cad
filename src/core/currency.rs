//! Currency rate provider abstraction

use super::error::Result;
use super::rates::{CurrencyCatalog, RateSnapshot};
use super::usage::UsageInfo;
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Current rates, quoted against `base`.
    async fn fetch_latest_rates(&self, base: &str) -> Result<RateSnapshot>;

    /// Rates as of `date`, quoted against `base`.
    async fn fetch_historical_rates(&self, date: NaiveDate, base: &str) -> Result<RateSnapshot>;

    async fn fetch_currencies(&self) -> Result<CurrencyCatalog>;

    async fn fetch_usage_info(&self) -> Result<UsageInfo>;
}
