//! Interactive mode (default)

use std::future::Future;

use super::{ProbeContext, RunOutcome};
use crate::cli::input::{LineSource, TOGGLE_COMMAND};
use crate::cli::repl::{ExitReason, InteractionLoop};
use crate::logging::format_elapsed;
use crate::output::OutputEvent;

/// Handle the default mode: connect once, then browse and run tools
pub async fn run_interactive(
    ctx: &ProbeContext,
    input: &mut dyn LineSource,
    interrupt: impl Future<Output = ()>,
) -> RunOutcome {
    tokio::pin!(interrupt);
    let output = ctx.output.as_ref();
    let endpoint = &ctx.config.endpoint;

    output.write(OutputEvent::Banner(
        "MCP PROBE - REMOTE TOOL TESTER".to_string(),
    ));
    output.write(OutputEvent::Text(format!("Server: {}", endpoint.server_url)));
    if let Some(source) = &ctx.config.source {
        output.write(OutputEvent::System(format!(
            "Config: {}",
            source.display()
        )));
    }
    output.write(OutputEvent::System(format!(
        "Type '{}' and press Enter at any time to show or hide transport logs",
        TOGGLE_COMMAND
    )));
    output.write(OutputEvent::NewLine);

    let establisher = ctx.establisher();
    let mut interaction = InteractionLoop::new(
        ctx.output.clone(),
        ctx.logging.clone(),
        ctx.config.policy.clone(),
    );
    let started = tokio::time::Instant::now();

    let finished = tokio::select! {
        result = interaction.run(&establisher, endpoint, input) => Some(result),
        _ = &mut interrupt => None,
    };
    let Some(result) = finished else {
        interaction.shutdown().await;
        output.write(OutputEvent::NewLine);
        output.write(OutputEvent::System("Interrupted".to_string()));
        return RunOutcome::Interrupted;
    };

    match result {
        Ok(summary) => {
            tracing::debug!(
                exit = ?summary.exit,
                invocations = summary.invocations,
                failures = summary.failures,
                "session finished"
            );
            if summary.exit != ExitReason::EmptyCatalog {
                output.write(OutputEvent::System(format!(
                    "{} call(s), {} failed, {}",
                    summary.invocations,
                    summary.failures,
                    format_elapsed(started.elapsed())
                )));
            }
            output.write(OutputEvent::Text("Goodbye!".to_string()));
            RunOutcome::Success
        }
        Err(err) => {
            output.write(OutputEvent::Error(err.to_string()));
            RunOutcome::Failed
        }
    }
}
