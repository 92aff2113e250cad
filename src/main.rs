use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fxq::core::config::OutputFormat;
use fxq::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Compare current exchange rates with rates from some days ago
    ///
    /// Example: `fxq rates USD JPY EUR` compares JPY and EUR against USD.
    Rates {
        /// Base currency, followed by target currencies
        currencies: Vec<String>,

        /// Number of days to look back
        #[arg(short, long)]
        days: Option<u32>,

        /// Output format: text, table or json
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },
    /// List supported currency codes and names
    Currencies,
    /// Show API key usage and quota health
    Usage,
}

impl From<Commands> for fxq::AppCommand {
    fn from(cmd: Commands) -> fxq::AppCommand {
        match cmd {
            Commands::Rates {
                currencies,
                days,
                format,
            } => fxq::AppCommand::Rates {
                args: currencies,
                past_days: days,
                format,
            },
            Commands::Currencies => fxq::AppCommand::Currencies,
            Commands::Usage => fxq::AppCommand::Usage,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => fxq::cli::setup::setup(),
        Some(cmd) => fxq::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = ?e, "Application failed");
        eprintln!("{}", fxq::user_message(e));
        std::process::exit(1);
    }
    Ok(())
}
