use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use mcp_probe::cli::{Cli, InputListener, LineSource};
use mcp_probe::config::{global_config_path, ConfigError, ProbeConfig, ProbeFileConfig};
use mcp_probe::handlers::{self, ProbeContext, RunOutcome};
use mcp_probe::logging::{init_tracing, LoggingState, OutputFilter};
use mcp_probe::output::{default_output, OutputEvent, OutputWriter};

/// Exit status for configuration problems
const CONFIG_ERROR: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = default_output(cli.plain);

    match run(cli, output.clone()).await {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            output.write(OutputEvent::Error(format!("{:#}", err)));
            ExitCode::from(CONFIG_ERROR)
        }
    }
}

/// Everything up to handing over to a handler. Errors here are configuration errors.
async fn run(cli: Cli, output: Arc<dyn OutputWriter>) -> Result<RunOutcome> {
    let (file_config, source) = match &cli.config {
        Some(path) => (ProbeFileConfig::load_from_path(path)?, Some(path.clone())),
        None => ProbeFileConfig::load()?,
    };

    // Quiet until the resolved config says otherwise; no transport runs before then
    let logging = LoggingState::new(false);
    let filter = OutputFilter::new(logging.clone(), &file_config.logging.suppress_patterns)
        .context("Invalid suppress pattern in [logging]")?;
    init_tracing(&filter, cli.verbose)?;

    let mut input = InputListener::spawn(logging.clone(), output.clone());

    let (file_config, source) = if cli.setup {
        let path = setup_path(&cli)?;
        let config = handlers::run_setup(&path, &mut input, output.as_ref()).await?;
        (config, Some(path))
    } else {
        (file_config, source)
    };

    let config = match file_config.resolve(cli.overrides(), source) {
        Ok(config) => config,
        Err(ConfigError::Missing(field)) if offer_setup(&cli) => {
            output.write(OutputEvent::Warning(format!("No {} configured", field)));
            if !confirm(&mut input, output.as_ref(), "Run setup now? [Y/n] ").await {
                return Err(ConfigError::Missing(field).into());
            }
            let path = setup_path(&cli)?;
            let config = handlers::run_setup(&path, &mut input, output.as_ref()).await?;
            config.resolve(cli.overrides(), Some(path))?
        }
        Err(err) => return Err(err.into()),
    };
    logging.set_verbose(config.logging.verbose);
    tracing::debug!(endpoint = ?config.endpoint, "configuration resolved");

    let ctx = context(config, output, logging)?;
    let outcome = if cli.test {
        handlers::run_connectivity_test(&ctx, handlers::ctrl_c()).await
    } else {
        handlers::run_interactive(&ctx, &mut input, handlers::ctrl_c()).await
    };
    Ok(outcome)
}

#[cfg(feature = "http")]
fn context(
    config: ProbeConfig,
    output: Arc<dyn OutputWriter>,
    logging: LoggingState,
) -> Result<ProbeContext> {
    ProbeContext::http(config, output, logging)
}

#[cfg(not(feature = "http"))]
fn context(
    _config: ProbeConfig,
    _output: Arc<dyn OutputWriter>,
    _logging: LoggingState,
) -> Result<ProbeContext> {
    anyhow::bail!("built without the `http` feature; no transport available")
}

/// `--config` wins; otherwise the per-user file
fn setup_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => Ok(global_config_path().ok_or(ConfigError::NoConfigDir)?),
    }
}

/// The wizard is only offered to a person at a terminal
fn offer_setup(cli: &Cli) -> bool {
    !cli.test && atty::is(atty::Stream::Stdin)
}

async fn confirm(input: &mut dyn LineSource, output: &dyn OutputWriter, question: &str) -> bool {
    output.write(OutputEvent::Prompt(question.to_string()));
    match input.next_line().await {
        Some(answer) => matches!(answer.trim().to_lowercase().as_str(), "" | "y" | "yes"),
        None => false,
    }
}
