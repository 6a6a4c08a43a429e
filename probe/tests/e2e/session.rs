//! E2E tests: interactive sessions driven by scripted input

use std::sync::Arc;

use mcp_probe::cli::ScriptedInput;
use mcp_probe::handlers::{never, run_interactive, RunOutcome};
use mcp_probe::mcp::mock::MockClientFactory;
use mcp_probe::mcp::InvocationResult;
use mcp_probe::output::{CaptureOutput, OutputEvent};
use serde_json::json;

use crate::support::{context, sample_server, ScriptedHealth};

fn results(output: &CaptureOutput) -> Vec<InvocationResult> {
    output
        .events()
        .into_iter()
        .filter_map(|e| match e {
            OutputEvent::ToolResult { result, .. } => Some(result),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_tool_without_parameters_runs_without_prompts() {
    let factory = MockClientFactory::new(sample_server());
    let output = CaptureOutput::new();
    let ctx = context(&factory, Arc::new(ScriptedHealth::new(vec![])), None, &output);
    let mut input = ScriptedInput::new(["1", "r", "q"]);

    let outcome = run_interactive(&ctx, &mut input, never()).await;

    assert_eq!(outcome, RunOutcome::Success);
    assert_eq!(
        output.count(|e| matches!(e, OutputEvent::ParameterPrompt(_))),
        0
    );
    let calls = factory.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].tool, "ping");
    assert!(calls[0].arguments.is_empty());

    let results = results(&output);
    assert_eq!(results.len(), 1);
    assert!(results[0].is_success());
    assert_eq!(factory.closed_sessions(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_several_tools_in_one_session() {
    let factory = MockClientFactory::new(sample_server());
    let output = CaptureOutput::new();
    let ctx = context(&factory, Arc::new(ScriptedHealth::new(vec![])), None, &output);
    let mut input = ScriptedInput::new([
        "3", "r", "abc", "40", "", // add: bad integer, then a=40, b left to its default
        "b", "2", "r", "hi there", // echo
        "q",
    ]);

    let outcome = run_interactive(&ctx, &mut input, never()).await;

    assert_eq!(outcome, RunOutcome::Success);
    assert_eq!(input.remaining(), 0);

    let calls = factory.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].tool, "add");
    assert_eq!(json!(calls[0].arguments), json!({"a": 40, "b": 1}));
    assert_eq!(calls[1].tool, "echo");
    assert_eq!(json!(calls[1].arguments), json!({"message": "hi there"}));

    // One connection, one catalog fetch for the whole session
    assert_eq!(factory.connect_attempts(), vec![1]);
    assert_eq!(factory.list_calls(), 1);
}
