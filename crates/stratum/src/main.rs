//! Stratum CLI - Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "stratum")]
#[command(version)]
#[command(about = "Layered XML configuration loader", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge, validate and convert the configuration of a scope
    Read {
        /// Scope to load (defaults to the settings' default scope)
        scope: Option<String>,

        /// Reader settings file
        #[arg(short, long, value_name = "TOML")]
        config: PathBuf,

        /// Override the file name pattern from the settings
        #[arg(long, value_name = "GLOB")]
        file_name: Option<String>,

        /// Skip schema validation
        #[arg(long)]
        no_validate: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Record the outcome in this file inside the log directory
        #[arg(long, value_name = "FILE")]
        log: Option<String>,
    },

    /// Validate individual files against a schema
    Check {
        /// Files to validate
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Schema file (YAML)
        #[arg(short, long, value_name = "YAML")]
        schema: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Converted configuration as JSON
    Json,
    /// Merged document as XML
    Xml,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stratum=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Read {
            scope,
            config,
            file_name,
            no_validate,
            format,
            log,
        } => commands::read::execute(commands::read::ReadArgs {
            scope,
            config,
            file_name,
            no_validate,
            format,
            log,
        }),
        Commands::Check { files, schema } => commands::check::execute(&files, &schema),
    }
}
