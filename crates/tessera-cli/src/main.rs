//! Tessera CLI entrypoint.

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod handlers;

use commands::{Commands, ConfigCommands};
use config::{CliConfig, OutputFormat};
use handlers::{IssueArgs, ValidateArgs};

#[derive(Parser)]
#[command(name = "tessera")]
#[command(author, version, about = "Offline license issuing and validation", long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (overrides config)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = CliConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Ignoring unreadable config file");
        CliConfig::default()
    });
    if let Some(format) = cli.format {
        config.output_format = format;
    }

    match cli.command {
        Commands::Keygen { out_dir } => handlers::keygen(out_dir).await?,
        Commands::Issue {
            signing_key,
            product,
            valid_from,
            valid_until,
            licensee,
            quantity,
            features,
            properties,
            compact,
            out,
        } => {
            handlers::issue(IssueArgs {
                signing_key,
                product,
                valid_from,
                valid_until,
                licensee,
                quantity,
                features,
                properties,
                compact,
                out,
            })
            .await?
        }
        Commands::Validate {
            path,
            verify_keys,
            product,
            features,
            quantity,
            at,
        } => {
            let valid = handlers::validate(
                &config,
                ValidateArgs {
                    path,
                    verify_keys,
                    product,
                    features,
                    quantity,
                    at,
                },
            )
            .await?;
            if !valid {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Inspect { path, verify_keys } => {
            handlers::inspect(&config, &path, &verify_keys).await?
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => handlers::show_config(&config)?,
            ConfigCommands::Set { key, value } => handlers::set_config(&key, &value)?,
        },
    }

    Ok(ExitCode::SUCCESS)
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
