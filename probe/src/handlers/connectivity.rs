//! Connectivity check (`--test`)
//!
//! Wake, grace, connect, list tools, report, exit. Never enters the
//! interactive loop.

use std::future::Future;

use super::{ProbeContext, RunOutcome};
use crate::connect::{EstablishReport, WakeOutcome};
use crate::mcp::fetch_catalog;
use crate::output::OutputEvent;

fn wake_summary(wake: WakeOutcome) -> String {
    match wake {
        WakeOutcome::Skipped => "skipped (no health URL)".to_string(),
        WakeOutcome::Ready { attempts } => format!("ready after {} attempt(s)", attempts),
        WakeOutcome::Unready { attempts } => {
            format!("not ready after {} attempt(s), connected anyway", attempts)
        }
    }
}

fn connect_summary(report: &EstablishReport) -> String {
    format!(
        "{} attempt(s), {} retry delay(s)",
        report.attempts, report.retry_delays
    )
}

/// Handle `--test`
pub async fn run_connectivity_test(
    ctx: &ProbeContext,
    interrupt: impl Future<Output = ()>,
) -> RunOutcome {
    tokio::pin!(interrupt);
    let output = ctx.output.as_ref();
    let endpoint = &ctx.config.endpoint;

    output.write(OutputEvent::Banner("CONNECTIVITY TEST".to_string()));
    output.write(OutputEvent::Text(format!("Server URL: {}", endpoint.server_url)));
    output.write(OutputEvent::Text(format!(
        "Health URL: {}",
        endpoint.health_url.as_deref().unwrap_or("Not configured")
    )));
    output.write(OutputEvent::NewLine);

    let establisher = ctx.establisher();
    let established = tokio::select! {
        result = establisher.establish(endpoint, &ctx.config.policy) => result,
        _ = &mut interrupt => {
            output.write(OutputEvent::System("Interrupted".to_string()));
            return RunOutcome::Interrupted;
        }
    };

    let established = match established {
        Ok(established) => established,
        Err(err) => {
            output.write(OutputEvent::Error(format!(
                "Failed to connect to MCP server: {}",
                err
            )));
            return RunOutcome::Failed;
        }
    };

    let session = established.session;
    let catalog = tokio::select! {
        result = fetch_catalog(session.as_ref(), ctx.config.policy.catalog_timeout()) => Some(result),
        _ = &mut interrupt => None,
    };
    session.close().await;
    let Some(catalog) = catalog else {
        output.write(OutputEvent::System("Interrupted".to_string()));
        return RunOutcome::Interrupted;
    };

    match catalog {
        Ok(catalog) => {
            output.write(OutputEvent::NewLine);
            output.write(OutputEvent::Text("✓ Successfully connected!".to_string()));
            output.write(OutputEvent::Text(format!(
                "✓ Server has {} tools available",
                catalog.len()
            )));
            output.write(OutputEvent::System(format!(
                "Wake-up: {}",
                wake_summary(established.report.wake)
            )));
            output.write(OutputEvent::System(format!(
                "Connect: {}",
                connect_summary(&established.report)
            )));
            RunOutcome::Success
        }
        Err(err) => {
            output.write(OutputEvent::Error(format!("Connected, but {}", err)));
            RunOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{never, testing};
    use crate::mcp::mock::{ConnectBehavior, MockClientFactory, MockServer};
    use crate::mcp::{ConnectError, SessionError, ToolDescriptor};
    use crate::output::CaptureOutput;
    use std::time::Duration;

    fn two_tools() -> MockServer {
        MockServer::new()
            .with_tool(ToolDescriptor::new("ping", None, None))
            .with_tool(ToolDescriptor::new("echo", Some("Echo".into()), None))
    }

    fn texts(output: &CaptureOutput) -> Vec<String> {
        output
            .events()
            .into_iter()
            .filter_map(|e| match e {
                OutputEvent::Text(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_reports_tool_count_and_closes() {
        let factory = MockClientFactory::new(two_tools());
        let output = CaptureOutput::new();
        let ctx = testing::context(&factory, &output);

        let outcome = run_connectivity_test(&ctx, never()).await;

        assert_eq!(outcome, RunOutcome::Success);
        let texts = texts(&output);
        assert!(texts.iter().any(|t| t == "Health URL: Not configured"));
        assert!(texts.iter().any(|t| t == "✓ Server has 2 tools available"));
        assert_eq!(factory.list_calls(), 1);
        assert_eq!(factory.closed_sessions(), 1);
        assert!(factory.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_then_reports_summary() {
        let factory = MockClientFactory::new(two_tools()).with_connect_script(vec![
            ConnectBehavior::Fail(ConnectError::classify("503 Service Unavailable")),
            ConnectBehavior::Succeed,
        ]);
        let output = CaptureOutput::new();
        let ctx = testing::context(&factory, &output);

        let outcome = run_connectivity_test(&ctx, never()).await;

        assert_eq!(outcome, RunOutcome::Success);
        assert_eq!(
            output.count(|e| matches!(e, OutputEvent::System(s) if s == "Connect: 2 attempt(s), 1 retry delay(s)")),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejection_fails() {
        let factory = MockClientFactory::new(two_tools()).with_connect_script(vec![
            ConnectBehavior::Fail(ConnectError::Rejected("401 Unauthorized".into())),
        ]);
        let output = CaptureOutput::new();
        let ctx = testing::context(&factory, &output);

        let outcome = run_connectivity_test(&ctx, never()).await;

        assert_eq!(outcome, RunOutcome::Failed);
        assert_eq!(outcome.code(), 1);
        assert_eq!(factory.connect_attempts(), vec![1]);
        assert_eq!(output.count(|e| matches!(e, OutputEvent::Error(_))), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_catalog_failure_fails_and_closes() {
        let server = two_tools().with_list_error(SessionError::Closed);
        let factory = MockClientFactory::new(server);
        let output = CaptureOutput::new();
        let ctx = testing::context(&factory, &output);

        let outcome = run_connectivity_test(&ctx, never()).await;

        assert_eq!(outcome, RunOutcome::Failed);
        assert_eq!(factory.closed_sessions(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_during_connect() {
        let factory = MockClientFactory::new(two_tools())
            .with_connect_script(vec![ConnectBehavior::Hang]);
        let output = CaptureOutput::new();
        let ctx = testing::context(&factory, &output);

        let interrupt = tokio::time::sleep(Duration::from_secs(3));
        let outcome = run_connectivity_test(&ctx, interrupt).await;

        assert_eq!(outcome, RunOutcome::Interrupted);
        assert_eq!(outcome.code(), 0);
    }

    #[test]
    fn test_wake_summary() {
        assert!(wake_summary(WakeOutcome::Skipped).contains("skipped"));
        assert_eq!(
            wake_summary(WakeOutcome::Ready { attempts: 2 }),
            "ready after 2 attempt(s)"
        );
    }

    #[test]
    fn test_connect_summary() {
        let report = EstablishReport {
            wake: WakeOutcome::Skipped,
            grace: None,
            attempts: 3,
            retry_delays: 2,
        };
        assert_eq!(connect_summary(&report), "3 attempt(s), 2 retry delay(s)");
        assert_eq!(report.grace, None::<Duration>);
    }
}
