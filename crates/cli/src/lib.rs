pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use fleetcfg_core::config::{AppConfig, LoadOptions, LogFormat};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "fleetcfg",
    about = "Forklift fleet configurator CLI",
    long_about = "Browse the forklift catalog, price fleet configurations, and inspect configurator settings.",
    after_help = "Examples:\n  fleetcfg catalog --json\n  fleetcfg quote --model cx-3000 --capacity 5000 --quantity 7\n  fleetcfg validate-catalog catalog.toml"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a fleetcfg.toml config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "List models, options, add-ons, and fleet discount tiers")]
    Catalog {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Resolve a configuration and print its fleet quote summary")]
    Quote(commands::quote::QuoteArgs),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Load and validate a catalog TOML file without using it")]
    ValidateCatalog {
        #[arg(help = "Catalog file to check")]
        path: PathBuf,
    },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Catalog { .. } => "catalog",
            Self::Quote(_) => "quote",
            Self::Config => "config",
            Self::ValidateCatalog { .. } => "validate-catalog",
        }
    }
}

/// Installs the global subscriber. Events go to stderr so command output on stdout stays
/// parseable. Calling this more than once keeps the first subscriber.
pub fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_new(config.logging.level.trim())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = LoadOptions { config_path: cli.config.clone(), ..LoadOptions::default() };

    // Config errors are reported by the command itself.
    init_logging(&AppConfig::load(options.clone()).unwrap_or_default());

    let command_name = cli.command.name();
    let result = match cli.command {
        Command::Catalog { json } => commands::catalog::run(options, json),
        Command::Quote(args) => commands::quote::run(options, &args),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(options) }
        }
        Command::ValidateCatalog { path } => commands::validate_catalog::run(&path),
    };

    info!(
        event_name = "cli.command.finished",
        command = command_name,
        exit_code = result.exit_code,
        "command finished"
    );
    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
