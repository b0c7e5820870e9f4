//! `stratum read` implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use stratum_config::{
    ConfigError, Converter, EnvironmentConfig, ProcessEnvironment, ReaderSettings, WriteMode,
    XmlConverter,
};
use tracing::{debug, info};

use crate::OutputFormat;

/// Arguments for the read command
#[derive(Debug)]
pub struct ReadArgs {
    pub scope: Option<String>,
    pub config: PathBuf,
    pub file_name: Option<String>,
    pub no_validate: bool,
    pub format: OutputFormat,
    pub log: Option<String>,
}

/// Execute the read command
pub fn execute(args: ReadArgs) -> Result<()> {
    let environment = ProcessEnvironment;

    let mut settings = ReaderSettings::from_file(&args.config)
        .with_context(|| format!("Failed to load settings from {}", args.config.display()))?;
    if let Some(file_name) = &args.file_name {
        settings.file_name = file_name.clone();
    }
    if args.no_validate {
        settings.validate = Some(false);
    }
    debug!(settings = ?settings, "Loaded reader settings");

    let scope = args.scope.as_deref();
    let result = match args.format {
        OutputFormat::Json => render(&settings, &environment, settings.converter(), scope, |map| {
            Ok(serde_json::to_string_pretty(&map)?)
        }),
        OutputFormat::Xml => render(&settings, &environment, XmlConverter, scope, Ok),
    };

    if let Some(log_file) = &args.log {
        let logger = settings
            .logger(&environment)
            .context("Failed to prepare log directory")?;
        let outcome = match &result {
            Ok(_) => "ok".to_string(),
            Err(err) => format!("failed: {:#}", err),
        };
        let line = format!(
            "scope={} file_name={} {}\n",
            scope.unwrap_or("(default)"),
            settings.file_name,
            outcome
        );
        logger
            .log(&line, log_file, WriteMode::Append)
            .context("Failed to write log file")?;
        info!(file = %logger.log_directory().join(log_file).display(), "Recorded read outcome");
    }

    println!("{}", result?);
    Ok(())
}

fn render<C, F>(
    settings: &ReaderSettings,
    environment: &dyn EnvironmentConfig,
    converter: C,
    scope: Option<&str>,
    format: F,
) -> Result<String>
where
    C: Converter,
    F: FnOnce(C::Output) -> Result<String>,
{
    let reader = settings
        .reader_with(environment, converter)
        .context("Failed to set up configuration reader")?;
    let output = reader.read(scope).map_err(describe)?;
    format(output)
}

fn describe(err: ConfigError) -> anyhow::Error {
    match err.file() {
        Some(file) => {
            let file = file.to_string();
            anyhow::Error::new(err).context(format!("Configuration file {} was rejected", file))
        }
        None => anyhow::Error::new(err).context("Failed to read configuration"),
    }
}
