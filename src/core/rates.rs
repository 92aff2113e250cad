//! Rate snapshots, currency catalogs and rebasing

use super::error::{FxError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// A complete set of currency rates quoted against a single base currency,
/// valid at one instant (latest) or one historical date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    base: String,
    rates: HashMap<String, f64>,
}

impl RateSnapshot {
    pub fn new(base: impl Into<String>, rates: HashMap<String, f64>) -> Self {
        Self {
            base: base.into(),
            rates,
        }
    }

    /// Builds a snapshot from provider data. Rates that are not strictly
    /// positive and finite are dropped, so one bad entry only hides that
    /// currency.
    pub fn sanitized(base: impl Into<String>, mut rates: HashMap<String, f64>) -> Self {
        rates.retain(|currency, rate| {
            let valid = is_valid_rate(*rate);
            if !valid {
                warn!(currency = %currency, rate = *rate, "Dropping invalid rate");
            }
            valid
        });
        Self::new(base, rates)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn get(&self, currency: &str) -> Option<f64> {
        self.rates.get(currency).copied()
    }

    pub fn rates(&self) -> &HashMap<String, f64> {
        &self.rates
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Re-quotes this snapshot against `target`.
    ///
    /// Given `1 base = V units of K` and `1 base = r units of target`, the
    /// result holds `1 target = V / r units of K`. The slot of `target`
    /// itself is replaced by the old base at `1 / r`, so every source code
    /// keeps exactly one counterpart in the result.
    ///
    /// Since the snapshot records its own base, rebasing an already rebased
    /// snapshot yields the same cross rates as rebasing the original.
    ///
    /// # Errors
    /// - [`FxError::UnknownCurrency`] if `target` is absent from the snapshot
    /// - [`FxError::InvalidRate`] if the rate of `target` is zero, negative or not finite
    pub fn rebase(&self, target: &str) -> Result<RateSnapshot> {
        if self.base == target {
            return Ok(self.clone());
        }

        let pivot = self
            .get(target)
            .ok_or_else(|| FxError::UnknownCurrency(target.to_string()))?;
        if !is_valid_rate(pivot) {
            return Err(FxError::InvalidRate {
                currency: target.to_string(),
                rate: pivot,
            });
        }

        let rates = self
            .rates
            .iter()
            .map(|(code, rate)| {
                if code == target {
                    (self.base.clone(), 1.0 / pivot)
                } else {
                    (code.clone(), rate / pivot)
                }
            })
            .collect();

        Ok(RateSnapshot::new(target, rates))
    }
}

fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

/// Currency code to display name mapping. Used for decoration only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCatalog(BTreeMap<String, String>);

impl CurrencyCatalog {
    pub fn new(names: BTreeMap<String, String>) -> Self {
        Self(names)
    }

    pub fn name(&self, code: &str) -> Option<&str> {
        self.0.get(code).map(String::as_str)
    }

    /// Entries sorted by currency code.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for CurrencyCatalog {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
