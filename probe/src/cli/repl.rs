//! Interactive tool session
//!
//! `InteractionLoop` brings the connection up once, fetches the catalog once,
//! then lets the user pick tools, fill in parameters and run them until they
//! quit. A failed call lands back on the tool view with the session intact.

use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;
use tokio::time::Instant;

use super::input::{report_toggle, LineSource};
use super::states::{
    parse_browse, parse_tool, BrowseCommand, LoopState, ToolCommand, ABORT_PARAMETERS,
};
use crate::config::{ConnectionAttemptPolicy, ServerEndpoint};
use crate::connect::{ConnectionEstablisher, ConnectionFailure, EstablishReport};
use crate::logging::{format_elapsed, LoggingState};
use crate::mcp::{
    fetch_catalog, Catalog, CatalogError, FailureKind, InvocationResult, McpSession,
    SessionError, ToolDescriptor,
};
use crate::output::{OutputEvent, OutputWriter, Phase, StepEvent, StepStatus};
use crate::params::{arguments, coerce};

/// Fatal to the whole session
#[derive(Debug, Error)]
pub enum LoopError {
    #[error(transparent)]
    Connection(#[from] ConnectionFailure),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Quit,
    /// stdin closed
    InputClosed,
    EmptyCatalog,
}

/// What happened during a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSummary {
    pub exit: ExitReason,
    pub report: EstablishReport,
    pub tools: usize,
    pub invocations: usize,
    pub failures: usize,
}

/// Outcome of a parameter round
enum Collected {
    Complete(Map<String, Value>),
    Aborted,
    InputClosed,
}

/// Top-level interactive state machine
pub struct InteractionLoop {
    output: Arc<dyn OutputWriter>,
    logging: LoggingState,
    policy: ConnectionAttemptPolicy,
    state: LoopState,
    session: Option<Box<dyn McpSession>>,
    invocations: usize,
    failures: usize,
}

impl InteractionLoop {
    pub fn new(
        output: Arc<dyn OutputWriter>,
        logging: LoggingState,
        policy: ConnectionAttemptPolicy,
    ) -> Self {
        Self {
            output,
            logging,
            policy,
            state: LoopState::Disconnected,
            session: None,
            invocations: 0,
            failures: 0,
        }
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    fn emit(&self, event: OutputEvent) {
        self.output.write(event);
    }

    fn toggle_logs(&self) {
        report_toggle(self.output.as_ref(), self.logging.toggle());
    }

    /// Read one answer for the current state's prompt
    async fn read(&mut self, input: &mut dyn LineSource) -> Option<String> {
        if let Some(prompt) = self.state.prompt() {
            self.emit(OutputEvent::Prompt(prompt.to_string()));
        }
        self.output.flush();
        let line = input.next_line().await;
        if line.is_none() {
            tracing::debug!(state = self.state.name(), "input closed");
        }
        line
    }

    /// Connect, fetch the catalog, and serve the user until they leave.
    ///
    /// The session is closed before returning. If this future is dropped
    /// part-way, call [`InteractionLoop::shutdown`] to close it.
    pub async fn run(
        &mut self,
        establisher: &ConnectionEstablisher,
        endpoint: &ServerEndpoint,
        input: &mut dyn LineSource,
    ) -> Result<LoopSummary, LoopError> {
        self.state = LoopState::Connecting;
        let established = match establisher.establish(endpoint, &self.policy).await {
            Ok(established) => established,
            Err(err) => {
                self.state = LoopState::Exiting;
                return Err(err.into());
            }
        };
        let report = established.report;
        self.session = Some(established.session);

        let catalog = match self.fetch_catalog().await {
            Ok(catalog) => catalog,
            Err(err) => {
                self.shutdown().await;
                return Err(err.into());
            }
        };

        let exit = if catalog.is_empty() {
            self.emit(OutputEvent::Text(
                "No tools available on this server.".to_string(),
            ));
            self.state = LoopState::Exiting;
            ExitReason::EmptyCatalog
        } else {
            self.state = LoopState::Browsing;
            self.emit(OutputEvent::ToolList(catalog.clone()));
            self.drive(&catalog, input).await
        };

        self.shutdown().await;
        Ok(LoopSummary {
            exit,
            report,
            tools: catalog.len(),
            invocations: self.invocations,
            failures: self.failures,
        })
    }

    async fn fetch_catalog(&self) -> Result<Catalog, CatalogError> {
        let session = self
            .session
            .as_deref()
            .ok_or(CatalogError::Failed(SessionError::Closed))?;

        self.emit(OutputEvent::Step(
            StepEvent::new(Phase::Catalog, StepStatus::InProgress)
                .with_detail("retrieving tool manifest"),
        ));
        match fetch_catalog(session, self.policy.catalog_timeout()).await {
            Ok(catalog) => {
                self.emit(OutputEvent::Step(
                    StepEvent::new(Phase::Catalog, StepStatus::Success)
                        .with_detail(format!("found {} tools", catalog.len())),
                ));
                Ok(catalog)
            }
            Err(err) => {
                self.emit(OutputEvent::Step(
                    StepEvent::new(Phase::Catalog, StepStatus::Failed).with_detail(err.to_string()),
                ));
                Err(err)
            }
        }
    }

    /// Close the live session, if any
    pub async fn shutdown(&mut self) {
        self.state = LoopState::Exiting;
        if let Some(session) = self.session.take() {
            session.close().await;
            tracing::debug!("session closed");
        }
    }

    /// Browsing onwards, until Exiting
    async fn drive(&mut self, catalog: &Catalog, input: &mut dyn LineSource) -> ExitReason {
        loop {
            match self.state.clone() {
                LoopState::Browsing => {
                    let Some(line) = self.read(input).await else {
                        return ExitReason::InputClosed;
                    };
                    match parse_browse(&line, catalog.len()) {
                        Ok(BrowseCommand::Select(position)) => {
                            if let Some(tool) = catalog.get(position) {
                                self.emit(OutputEvent::ToolDetail(tool.clone()));
                                self.state = LoopState::ToolSelected(position);
                            }
                        }
                        Ok(BrowseCommand::List) => {
                            self.emit(OutputEvent::ToolList(catalog.clone()))
                        }
                        Ok(BrowseCommand::ToggleLogs) => self.toggle_logs(),
                        Ok(BrowseCommand::Quit) => self.state = LoopState::Exiting,
                        Err(err) => self.emit(OutputEvent::Warning(err.to_string())),
                    }
                }

                LoopState::ToolSelected(position) => {
                    let Some(tool) = catalog.get(position) else {
                        self.state = LoopState::Browsing;
                        continue;
                    };
                    let Some(line) = self.read(input).await else {
                        return ExitReason::InputClosed;
                    };
                    match parse_tool(&line) {
                        Ok(ToolCommand::Run) if tool.has_params() => {
                            self.state = LoopState::CollectingParameters(position)
                        }
                        Ok(ToolCommand::Run) => {
                            self.state = LoopState::Invoking {
                                tool: position,
                                arguments: Map::new(),
                            }
                        }
                        Ok(ToolCommand::Details) => {
                            self.emit(OutputEvent::ToolDetail(tool.clone()))
                        }
                        Ok(ToolCommand::Back) => {
                            self.state = LoopState::Browsing;
                            self.emit(OutputEvent::ToolList(catalog.clone()));
                        }
                        Ok(ToolCommand::ToggleLogs) => self.toggle_logs(),
                        Ok(ToolCommand::Quit) => self.state = LoopState::Exiting,
                        Err(err) => self.emit(OutputEvent::Warning(err.to_string())),
                    }
                }

                LoopState::CollectingParameters(position) => {
                    let Some(tool) = catalog.get(position) else {
                        self.state = LoopState::Browsing;
                        continue;
                    };
                    match self.collect_parameters(tool, input).await {
                        Collected::Complete(arguments) => {
                            self.state = LoopState::Invoking {
                                tool: position,
                                arguments,
                            }
                        }
                        Collected::Aborted => {
                            self.emit(OutputEvent::Status("Parameter entry cancelled".into()));
                            self.state = LoopState::ToolSelected(position);
                        }
                        Collected::InputClosed => return ExitReason::InputClosed,
                    }
                }

                LoopState::Invoking { tool, arguments } => {
                    let Some(descriptor) = catalog.get(tool) else {
                        self.state = LoopState::Browsing;
                        continue;
                    };
                    let result = self.invoke(descriptor, arguments).await;
                    self.invocations += 1;
                    if !result.is_success() {
                        self.failures += 1;
                    }
                    self.emit(OutputEvent::ToolResult {
                        name: descriptor.name.clone(),
                        result,
                    });
                    self.state = LoopState::ShowingResult(tool);
                }

                LoopState::ShowingResult(position) => {
                    self.emit(OutputEvent::NewLine);
                    self.state = LoopState::ToolSelected(position);
                }

                LoopState::Exiting => return ExitReason::Quit,

                LoopState::Disconnected | LoopState::Connecting => {
                    tracing::warn!(state = self.state.name(), "no session to drive");
                    self.state = LoopState::Exiting;
                }
            }
        }
    }

    /// Ask for each parameter in schema order until all required ones are set
    async fn collect_parameters(
        &mut self,
        tool: &ToolDescriptor,
        input: &mut dyn LineSource,
    ) -> Collected {
        self.emit(OutputEvent::Banner("ENTER PARAMETERS".to_string()));
        self.emit(OutputEvent::System(format!(
            "Press Enter to skip optional parameters, {} to cancel",
            ABORT_PARAMETERS
        )));

        let mut values = Vec::new();
        for param in &tool.params {
            self.emit(OutputEvent::ParameterPrompt(param.clone()));
            loop {
                let Some(line) = self.read(input).await else {
                    return Collected::InputClosed;
                };
                if line.trim() == ABORT_PARAMETERS {
                    return Collected::Aborted;
                }
                match coerce(&line, param) {
                    Ok(Some(value)) => {
                        values.push((param.name.clone(), value));
                        break;
                    }
                    Ok(None) => break,
                    Err(err) => {
                        self.emit(OutputEvent::Error(format!(
                            "Invalid value for {} ({}): {}",
                            param.name, param.kind, err
                        )));
                    }
                }
            }
        }

        Collected::Complete(arguments(&values))
    }

    /// One tool call under the tool timeout
    async fn invoke(&self, tool: &ToolDescriptor, arguments: Map<String, Value>) -> InvocationResult {
        let started = Instant::now();
        let Some(session) = self.session.as_deref() else {
            return InvocationResult::Failure {
                kind: FailureKind::Transport,
                detail: "session is closed".to_string(),
                elapsed: started.elapsed(),
            };
        };

        let payload = Value::Object(arguments.clone());
        tracing::debug!(tool = %tool.name, payload = %payload, "tools/call");
        self.emit(OutputEvent::ToolStart {
            name: tool.name.clone(),
            arguments: payload,
        });

        let timeout = self.policy.tool_timeout();
        let outcome = tokio::time::timeout(timeout, session.call_tool(&tool.name, arguments)).await;
        let elapsed = started.elapsed();
        tracing::debug!(tool = %tool.name, "tools/call: {}", format_elapsed(elapsed));

        match outcome {
            Err(_) => InvocationResult::Failure {
                kind: FailureKind::Timeout,
                detail: format!("no response within {}", format_elapsed(timeout)),
                elapsed,
            },
            Ok(Err(err)) => InvocationResult::Failure {
                kind: FailureKind::Transport,
                detail: err.to_string(),
                elapsed,
            },
            Ok(Ok(output)) if output.is_error => {
                let text = output.joined_text();
                InvocationResult::Failure {
                    kind: FailureKind::Tool,
                    detail: if text.is_empty() {
                        "tool reported an error".to_string()
                    } else {
                        text
                    },
                    elapsed,
                }
            }
            Ok(Ok(output)) => InvocationResult::Success {
                content: output.content,
                structured: output.structured,
                elapsed,
            },
        }
    }
}
