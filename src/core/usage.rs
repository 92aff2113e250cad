//! API key usage and plan information

use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageInfo {
    pub plan_name: String,
    pub update_frequency: String,
    pub requests: u64,
    pub requests_quota: u64,
    pub requests_remaining: u64,
    pub days_elapsed: u64,
    pub days_remaining: u64,
    pub daily_average: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageHealth {
    Healthy,
    Low,
    Critical,
}

impl Display for UsageHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                UsageHealth::Healthy => "healthy",
                UsageHealth::Low => "low",
                UsageHealth::Critical => "critical",
            }
        )
    }
}

impl UsageInfo {
    /// Share of the quota still available. A zero quota counts as 1.
    pub fn remaining_percent(&self) -> f64 {
        let quota = self.requests_quota.max(1);
        self.requests_remaining as f64 / quota as f64 * 100.0
    }

    pub fn health(&self) -> UsageHealth {
        let remaining = self.remaining_percent();
        if remaining > 20.0 {
            UsageHealth::Healthy
        } else if remaining > 5.0 {
            UsageHealth::Low
        } else {
            UsageHealth::Critical
        }
    }
}
