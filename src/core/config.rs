use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, fs, path::PathBuf, str::FromStr};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://openexchangerates.org/api";
pub const DEFAULT_ANCHOR_CURRENCY: &str = "USD";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Plain text table, as sent to a chat session
    #[default]
    Text,
    /// Styled terminal table
    Table,
    /// Structured payload for a template renderer
    Json,
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                OutputFormat::Text => "text",
                OutputFormat::Table => "table",
                OutputFormat::Json => "json",
            }
        )
    }
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid output format: {}", s)),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OpenExchangeRatesConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_anchor_currency")]
    pub anchor_currency: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenExchangeRatesConfig {
    fn default() -> Self {
        OpenExchangeRatesConfig {
            base_url: default_base_url(),
            anchor_currency: default_anchor_currency(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub open_exchange_rates: OpenExchangeRatesConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    #[serde(default = "default_target_currencies")]
    pub target_currencies: Vec<String>,
    #[serde(default = "default_past_days")]
    pub past_days: u32,
    #[serde(default)]
    pub output: OutputFormat,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_anchor_currency() -> String {
    DEFAULT_ANCHOR_CURRENCY.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_base_currency() -> String {
    "CNY".to_string()
}

fn default_target_currencies() -> Vec<String> {
    vec!["USD".to_string(), "EUR".to_string(), "JPY".to_string()]
}

fn default_past_days() -> u32 {
    7
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_key: None,
            base_currency: default_base_currency(),
            target_currencies: default_target_currencies(),
            past_days: default_past_days(),
            output: OutputFormat::default(),
            providers: ProvidersConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "fxq", "fxq")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// The configured API key, if it is set and not blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}
