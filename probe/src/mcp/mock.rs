//! Scripted in-process transport
//!
//! Stands in for a remote server in tests and in `--no-default-features`
//! builds. Connect attempts follow a script; tool calls answer from a table.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::transport::{ClientFactory, ConnectError, McpSession, SessionError, TransportClient};
use super::types::{ToolDescriptor, ToolOutput};
use crate::config::ServerEndpoint;

/// What the next connect attempt does
#[derive(Debug, Clone)]
pub enum ConnectBehavior {
    Succeed,
    Fail(ConnectError),
    /// Never answers; only a timeout ends the attempt
    Hang,
}

/// Canned answer for a tool
#[derive(Debug, Clone)]
pub enum MockResponse {
    Output(ToolOutput),
    Error(SessionError),
    Delayed(Duration, ToolOutput),
}

/// Tools and answers served once connected
#[derive(Debug, Clone, Default)]
pub struct MockServer {
    tools: Vec<ToolDescriptor>,
    responses: HashMap<String, MockResponse>,
    list_delay: Option<Duration>,
    list_error: Option<SessionError>,
}

impl MockServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool(mut self, tool: ToolDescriptor) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_response(mut self, tool: &str, response: MockResponse) -> Self {
        self.responses.insert(tool.to_string(), response);
        self
    }

    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = Some(delay);
        self
    }

    pub fn with_list_error(mut self, error: SessionError) -> Self {
        self.list_error = Some(error);
        self
    }
}

/// A recorded `call_tool`
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub tool: String,
    pub arguments: Map<String, Value>,
}

#[derive(Debug, Default)]
struct MockState {
    script: Mutex<VecDeque<ConnectBehavior>>,
    created: AtomicUsize,
    attempted_by: Mutex<Vec<usize>>,
    calls: Mutex<Vec<RecordedCall>>,
    list_calls: AtomicUsize,
    closed: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Factory handing out numbered mock clients
#[derive(Debug, Clone, Default)]
pub struct MockClientFactory {
    server: Arc<MockServer>,
    state: Arc<MockState>,
}

impl MockClientFactory {
    pub fn new(server: MockServer) -> Self {
        Self {
            server: Arc::new(server),
            state: Arc::default(),
        }
    }

    /// Behaviour of successive connect attempts; attempts past the end succeed
    pub fn with_connect_script(self, script: Vec<ConnectBehavior>) -> Self {
        *lock(&self.state.script) = script.into();
        self
    }

    /// Number of clients created so far
    pub fn created(&self) -> usize {
        self.state.created.load(Ordering::SeqCst)
    }

    /// Client ids in the order they attempted to connect
    pub fn connect_attempts(&self) -> Vec<usize> {
        lock(&self.state.attempted_by).clone()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.state.calls).clone()
    }

    pub fn list_calls(&self) -> usize {
        self.state.list_calls.load(Ordering::SeqCst)
    }

    pub fn closed_sessions(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }
}

impl ClientFactory for MockClientFactory {
    fn create(&self) -> Box<dyn TransportClient> {
        let id = self.state.created.fetch_add(1, Ordering::SeqCst) + 1;
        Box::new(MockClient {
            id,
            server: self.server.clone(),
            state: self.state.clone(),
        })
    }
}

struct MockClient {
    id: usize,
    server: Arc<MockServer>,
    state: Arc<MockState>,
}

#[async_trait]
impl TransportClient for MockClient {
    async fn connect(
        self: Box<Self>,
        _endpoint: &ServerEndpoint,
    ) -> Result<Box<dyn McpSession>, ConnectError> {
        lock(&self.state.attempted_by).push(self.id);
        let behavior = lock(&self.state.script)
            .pop_front()
            .unwrap_or(ConnectBehavior::Succeed);

        match behavior {
            ConnectBehavior::Succeed => Ok(Box::new(MockSession {
                server: self.server,
                state: self.state,
            })),
            ConnectBehavior::Fail(err) => Err(err),
            ConnectBehavior::Hang => std::future::pending().await,
        }
    }
}

struct MockSession {
    server: Arc<MockServer>,
    state: Arc<MockState>,
}

#[async_trait]
impl McpSession for MockSession {
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, SessionError> {
        self.state.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.server.list_delay {
            tokio::time::sleep(delay).await;
        }
        match &self.server.list_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.server.tools.clone()),
        }
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolOutput, SessionError> {
        lock(&self.state.calls).push(RecordedCall {
            tool: name.to_string(),
            arguments,
        });

        match self.server.responses.get(name) {
            Some(MockResponse::Output(output)) => Ok(output.clone()),
            Some(MockResponse::Error(err)) => Err(err.clone()),
            Some(MockResponse::Delayed(delay, output)) => {
                tokio::time::sleep(*delay).await;
                Ok(output.clone())
            }
            None => Ok(ToolOutput::text(format!("{} ok", name))),
        }
    }

    async fn close(self: Box<Self>) {
        self.state.closed.fetch_add(1, Ordering::SeqCst);
    }
}
