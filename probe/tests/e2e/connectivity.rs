//! E2E tests: `--test` flow
//!
//! Wake-up, grace, retried connect and the final report, on virtual time.

use std::sync::Arc;
use std::time::Duration;

use mcp_probe::handlers::{never, run_connectivity_test, RunOutcome};
use mcp_probe::mcp::mock::{ConnectBehavior, MockClientFactory};
use mcp_probe::mcp::ConnectError;
use mcp_probe::output::{CaptureOutput, OutputEvent};
use tokio::time::Instant;

use crate::support::{context, sample_server, step_labels, texts, ScriptedHealth};

fn transient() -> ConnectBehavior {
    ConnectBehavior::Fail(ConnectError::classify("connection refused"))
}

#[tokio::test(start_paused = true)]
async fn test_sleeping_server_wakes_and_connects() {
    let factory = MockClientFactory::new(sample_server()).with_connect_script(vec![
        transient(),
        transient(),
        ConnectBehavior::Succeed,
    ]);
    let health = Arc::new(ScriptedHealth::new(vec![503, 503]));
    let output = CaptureOutput::new();
    let ctx = context(&factory, health, Some("http://mcp.test/health"), &output);

    let started = Instant::now();
    let outcome = run_connectivity_test(&ctx, never()).await;

    assert_eq!(outcome, RunOutcome::Success);
    // 2 health intervals + grace + 2 retry delays
    assert_eq!(started.elapsed(), Duration::from_secs(10 + 20 + 10));
    assert_eq!(
        step_labels(&output.steps()),
        vec![
            "Wake-up InProgress",
            "Wake-up Failed",
            "Wake-up InProgress",
            "Wake-up Failed",
            "Wake-up InProgress",
            "Wake-up Success",
            "Initialization grace InProgress",
            "Initialization grace Success",
            "Connect (1/3) InProgress",
            "Connect (1/3) Failed",
            "Connect (2/3) InProgress",
            "Connect (2/3) Failed",
            "Connect (3/3) InProgress",
            "Connect (3/3) Success",
        ]
    );
    assert_eq!(factory.connect_attempts(), vec![1, 2, 3]);

    let texts = texts(&output);
    assert!(texts.contains(&"Health URL: http://mcp.test/health".to_string()));
    assert!(texts.contains(&"✓ Server has 3 tools available".to_string()));
    assert_eq!(
        output.count(|e| matches!(e, OutputEvent::System(s) if s == "Wake-up: ready after 3 attempt(s)")),
        1
    );
    assert_eq!(factory.closed_sessions(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_fail_after_two_delays() {
    let factory = MockClientFactory::new(sample_server())
        .with_connect_script(vec![transient(), transient(), transient()]);
    let health = Arc::new(ScriptedHealth::new(vec![]));
    let output = CaptureOutput::new();
    let ctx = context(&factory, health, None, &output);

    let started = Instant::now();
    let outcome = run_connectivity_test(&ctx, never()).await;

    assert_eq!(outcome, RunOutcome::Failed);
    assert_eq!(outcome.code(), 1);
    assert_eq!(started.elapsed(), Duration::from_secs(10));
    assert_eq!(factory.connect_attempts(), vec![1, 2, 3]);
    assert_eq!(factory.list_calls(), 0);
    assert_eq!(output.count(|e| matches!(e, OutputEvent::Error(_))), 1);
}

#[tokio::test(start_paused = true)]
async fn test_health_never_ready_still_tries_to_connect() {
    let factory = MockClientFactory::new(sample_server());
    let health = Arc::new(ScriptedHealth::new(vec![503; 6]));
    let output = CaptureOutput::new();
    let ctx = context(&factory, health, Some("http://mcp.test/health"), &output);

    let started = Instant::now();
    let outcome = run_connectivity_test(&ctx, never()).await;

    assert_eq!(outcome, RunOutcome::Success);
    // 5 intervals between 6 polls, then the grace period
    assert_eq!(started.elapsed(), Duration::from_secs(25 + 20));
    assert_eq!(output.count(|e| matches!(e, OutputEvent::Warning(_))), 1);
    assert_eq!(factory.connect_attempts(), vec![1]);
}
