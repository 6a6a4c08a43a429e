//! First-run setup wizard (`--setup`)
//!
//! Asks for the server URL, the bearer token and an optional health URL,
//! then writes them to the config file. Any settings already in that file
//! are kept; pressing Enter keeps the current value, and `-` or `none`
//! clears an optional one.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::cli::input::LineSource;
use crate::config::{validate_url, ProbeFileConfig};
use crate::output::{OutputEvent, OutputWriter};

/// Answers that clear an optional field
const CLEAR_WORDS: &[&str] = &["-", "none"];

/// Prompt until a valid answer is given. `Ok(None)` means the field was left empty.
async fn ask(
    input: &mut dyn LineSource,
    output: &dyn OutputWriter,
    label: &str,
    current: Option<&str>,
    required: bool,
    url_field: Option<&'static str>,
) -> Result<Option<String>> {
    loop {
        let hint = match current {
            Some(value) if url_field.is_some() && !required => {
                format!(" [{}] (- to clear)", value)
            }
            Some(value) if url_field.is_some() => format!(" [{}]", value),
            Some(_) => " [keep current]".to_string(),
            None if required => String::new(),
            None => " (Enter to skip)".to_string(),
        };
        output.write(OutputEvent::Prompt(format!("{}{}: ", label, hint)));

        let Some(line) = input.next_line().await else {
            bail!("input closed during setup");
        };
        let answer = line.trim();

        if !required && CLEAR_WORDS.contains(&answer.to_lowercase().as_str()) {
            return Ok(None);
        }

        if answer.is_empty() {
            if let Some(value) = current {
                return Ok(Some(value.to_string()));
            }
            if required {
                output.write(OutputEvent::Warning(format!("{} is required", label)));
                continue;
            }
            return Ok(None);
        }

        if let Some(field) = url_field {
            if let Err(e) = validate_url(field, answer) {
                output.write(OutputEvent::Warning(e.to_string()));
                continue;
            }
        }
        return Ok(Some(answer.to_string()));
    }
}

/// Run the wizard and save the result to `path`
pub async fn run_setup(
    path: &Path,
    input: &mut dyn LineSource,
    output: &dyn OutputWriter,
) -> Result<ProbeFileConfig> {
    let mut config = if path.exists() {
        ProbeFileConfig::load_from_path(path)
            .with_context(|| format!("Failed to load existing config {}", path.display()))?
    } else {
        ProbeFileConfig::default()
    };

    output.write(OutputEvent::Banner("MCP PROBE SETUP".to_string()));
    output.write(OutputEvent::System(format!(
        "Settings will be saved to {}",
        path.display()
    )));
    output.write(OutputEvent::NewLine);

    let server = &mut config.server;
    server.url = ask(
        input,
        output,
        "Server URL",
        server.url.as_deref(),
        true,
        Some("server url"),
    )
    .await?;
    server.token = ask(input, output, "Token", server.token.as_deref(), true, None).await?;
    server.health_url = ask(
        input,
        output,
        "Health URL",
        server.health_url.as_deref(),
        false,
        Some("health url"),
    )
    .await?;

    config
        .save_to_path(path)
        .with_context(|| format!("Failed to save config to {}", path.display()))?;
    tracing::info!(path = %path.display(), "config saved");
    output.write(OutputEvent::Status(format!(
        "Configuration saved to {}",
        path.display()
    )));

    Ok(config)
}
