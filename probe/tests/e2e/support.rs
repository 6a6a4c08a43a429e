//! Shared fixtures

use std::sync::Arc;

use async_trait::async_trait;
use mcp_probe::config::{ConnectionAttemptPolicy, LoggingConfig, ProbeConfig, ServerEndpoint};
use mcp_probe::connect::HealthEndpoint;
use mcp_probe::handlers::ProbeContext;
use mcp_probe::logging::LoggingState;
use mcp_probe::mcp::mock::{MockClientFactory, MockResponse, MockServer};
use mcp_probe::mcp::{ToolDescriptor, ToolOutput};
use mcp_probe::output::{CaptureOutput, OutputEvent, StepEvent};
use serde_json::json;

/// Health endpoint answering from a fixed list of statuses, then 200
pub struct ScriptedHealth {
    statuses: std::sync::Mutex<Vec<u16>>,
}

impl ScriptedHealth {
    pub fn new(mut statuses: Vec<u16>) -> Self {
        statuses.reverse();
        Self {
            statuses: std::sync::Mutex::new(statuses),
        }
    }
}

#[async_trait]
impl HealthEndpoint for ScriptedHealth {
    async fn check(&self, _url: &str) -> Result<u16, String> {
        let mut statuses = self.statuses.lock().unwrap();
        Ok(statuses.pop().unwrap_or(200))
    }
}

/// ping (no params), echo (required message), add (two integers)
pub fn sample_server() -> MockServer {
    MockServer::new()
        .with_tool(ToolDescriptor::new(
            "ping",
            Some("Check the server is alive".into()),
            Some(json!({"type": "object", "properties": {}})),
        ))
        .with_tool(ToolDescriptor::new(
            "echo",
            Some("Echo a message back".into()),
            Some(json!({
                "type": "object",
                "properties": {"message": {"type": "string"}},
                "required": ["message"]
            })),
        ))
        .with_tool(ToolDescriptor::new(
            "add",
            None,
            Some(json!({
                "type": "object",
                "properties": {
                    "a": {"type": "integer"},
                    "b": {"type": "integer", "default": 1}
                },
                "required": ["a"]
            })),
        ))
        .with_response("ping", MockResponse::Output(ToolOutput::text("pong")))
}

pub fn context(
    factory: &MockClientFactory,
    health: Arc<dyn HealthEndpoint>,
    health_url: Option<&str>,
    output: &CaptureOutput,
) -> ProbeContext {
    let mut endpoint = ServerEndpoint::new("http://mcp.test/mcp", "token");
    if let Some(url) = health_url {
        endpoint = endpoint.with_health_url(url);
    }
    let config = ProbeConfig {
        endpoint,
        policy: ConnectionAttemptPolicy::default(),
        logging: LoggingConfig::default(),
        source: None,
    };
    ProbeContext::new(
        config,
        Arc::new(output.clone()),
        LoggingState::new(false),
        Arc::new(factory.clone()),
        health,
    )
}

/// Steps as `phase status`, e.g. `Connect (1/3) Failed`
pub fn step_labels(steps: &[StepEvent]) -> Vec<String> {
    steps
        .iter()
        .map(|s| format!("{} {:?}", s.phase, s.status))
        .collect()
}

pub fn texts(output: &CaptureOutput) -> Vec<String> {
    output
        .events()
        .into_iter()
        .filter_map(|e| match e {
            OutputEvent::Text(t) => Some(t),
            _ => None,
        })
        .collect()
}
