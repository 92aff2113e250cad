pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::{AppConfig, OutputFormat};
use crate::core::query::RateQuery;
use crate::core::{FxError, RateProvider};
use crate::providers::OpenExchangeRatesClient;
use anyhow::Result;
use chrono::Utc;
use tracing::{debug, info};

/// Shown in place of provider failures; details go to the log.
pub const TRY_AGAIN_MESSAGE: &str = "Exchange rate query failed, please try again later";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Compare current rates with rates from `past_days` ago. `args` holds
    /// the optional base currency followed by target currencies.
    Rates {
        args: Vec<String>,
        past_days: Option<u32>,
        format: Option<OutputFormat>,
    },
    Currencies,
    Usage,
}

impl AppCommand {
    fn requires_api_key(&self) -> bool {
        !matches!(self, AppCommand::Currencies)
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fxq starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    if command.requires_api_key() && config.api_key().is_none() {
        anyhow::bail!(
            "API key is not configured. Set `api_key` in the configuration file (see `fxq setup`)"
        );
    }

    let client = OpenExchangeRatesClient::from_config(
        &config.providers.open_exchange_rates,
        config.api_key().unwrap_or_default(),
    );
    client.open()?;
    let result = execute(command, &config, &client).await;
    client.close();

    println!("{}", result?);
    Ok(())
}

/// Runs `command` against `provider` and returns the text to display.
pub async fn execute(
    command: AppCommand,
    config: &AppConfig,
    provider: &dyn RateProvider,
) -> Result<String> {
    match command {
        AppCommand::Rates {
            args,
            past_days,
            format,
        } => {
            let query =
                RateQuery::from_args(&args, &config.base_currency, &config.target_currencies);
            cli::rates::build_report(
                provider,
                &query,
                past_days.unwrap_or(config.past_days),
                format.unwrap_or(config.output),
                Utc::now().date_naive(),
            )
            .await
        }
        AppCommand::Currencies => cli::currencies::build_listing(provider).await,
        AppCommand::Usage => cli::usage::build_report(provider).await,
    }
}

/// Message for the user when a command fails. Provider failures collapse
/// into a generic retry hint; configuration problems are shown as is.
pub fn user_message(err: &anyhow::Error) -> String {
    if err.downcast_ref::<FxError>().is_some() {
        TRY_AGAIN_MESSAGE.to_string()
    } else {
        format!("{err:#}")
    }
}
