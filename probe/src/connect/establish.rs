//! Connection bring-up: wake, grace, connect-with-retry
//!
//! The three phases always run in that order. Wake runs only when a health
//! URL is configured, grace only when wake actually polled, and every connect
//! attempt uses a client fresh from the factory.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use super::health::{HealthEndpoint, HealthProbe, ProbeOutcome};
use crate::config::{ConnectionAttemptPolicy, ServerEndpoint};
use crate::logging::format_elapsed;
use crate::mcp::{ClientFactory, ConnectError, McpSession};
use crate::output::{OutputEvent, OutputWriter, Phase, StepEvent, StepStatus};

/// What the wake phase did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeOutcome {
    /// No health URL configured
    Skipped,
    Ready { attempts: u32 },
    /// Never saw a 2xx; connecting anyway
    Unready { attempts: u32 },
}

impl WakeOutcome {
    pub fn polled(&self) -> bool {
        !matches!(self, Self::Skipped)
    }
}

impl From<ProbeOutcome> for WakeOutcome {
    fn from(outcome: ProbeOutcome) -> Self {
        match outcome {
            ProbeOutcome::Ready { attempts } => Self::Ready { attempts },
            ProbeOutcome::Unready { attempts } => Self::Unready { attempts },
        }
    }
}

/// Summary of a successful bring-up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstablishReport {
    pub wake: WakeOutcome,
    /// Grace wait performed, if any
    pub grace: Option<Duration>,
    /// Connect attempts used, including the successful one
    pub attempts: u32,
    /// Retry delays slept between attempts
    pub retry_delays: u32,
}

/// Bring-up ended without a session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionFailure {
    /// Every attempt failed transiently
    #[error("server unreachable after {attempts} connect attempt(s): {last}")]
    Unreachable { attempts: u32, last: ConnectError },

    #[error("connection rejected: {0}")]
    Rejected(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

/// A live session plus how it was obtained
pub struct Established {
    pub session: Box<dyn McpSession>,
    pub report: EstablishReport,
}

impl std::fmt::Debug for Established {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Established")
            .field("report", &self.report)
            .finish_non_exhaustive()
    }
}

pub struct ConnectionEstablisher {
    factory: Arc<dyn ClientFactory>,
    health: HealthProbe,
    output: Arc<dyn OutputWriter>,
}

impl ConnectionEstablisher {
    pub fn new(
        factory: Arc<dyn ClientFactory>,
        health: Arc<dyn HealthEndpoint>,
        output: Arc<dyn OutputWriter>,
    ) -> Self {
        Self {
            factory,
            health: HealthProbe::new(health, output.clone()),
            output,
        }
    }

    fn step(&self, event: StepEvent) {
        self.output.write(OutputEvent::Step(event));
    }

    pub async fn establish(
        &self,
        endpoint: &ServerEndpoint,
        policy: &ConnectionAttemptPolicy,
    ) -> Result<Established, ConnectionFailure> {
        let wake = self.wake(endpoint, policy).await;
        let grace = self.grace(wake, policy).await;

        let total = policy.connect_attempts.max(1);
        let mut retry_delays = 0;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let phase = Phase::Connect { attempt, total };
            self.step(StepEvent::new(phase, StepStatus::InProgress).with_detail(&endpoint.server_url));

            let started = Instant::now();
            let client = self.factory.create();
            let result =
                match tokio::time::timeout(policy.connect_init_timeout(), client.connect(endpoint))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(ConnectError::timeout(policy.connect_init_timeout())),
                };
            tracing::debug!(attempt, "connect: {}", format_elapsed(started.elapsed()));

            let err = match result {
                Ok(session) => {
                    self.step(StepEvent::new(phase, StepStatus::Success));
                    return Ok(Established {
                        session,
                        report: EstablishReport {
                            wake,
                            grace,
                            attempts: attempt,
                            retry_delays,
                        },
                    });
                }
                Err(err) => err,
            };

            self.step(StepEvent::new(phase, StepStatus::Failed).with_detail(err.to_string()));
            match err {
                ConnectError::Rejected(message) => return Err(ConnectionFailure::Rejected(message)),
                ConnectError::Protocol(message) => return Err(ConnectionFailure::Protocol(message)),
                ConnectError::Transient { .. } if attempt >= total => {
                    return Err(ConnectionFailure::Unreachable {
                        attempts: attempt,
                        last: err,
                    });
                }
                ConnectError::Transient { kind, .. } => {
                    tracing::info!(attempt, %kind, "transient connect failure, retrying");
                    self.output.write(OutputEvent::Status(format!(
                        "Retrying in {}...",
                        format_elapsed(policy.connect_retry_delay())
                    )));
                    tokio::time::sleep(policy.connect_retry_delay()).await;
                    retry_delays += 1;
                }
            }
        }
    }

    async fn wake(&self, endpoint: &ServerEndpoint, policy: &ConnectionAttemptPolicy) -> WakeOutcome {
        let Some(health_url) = endpoint.health_url.as_deref() else {
            self.step(StepEvent::new(Phase::Wake, StepStatus::Skipped).with_detail("no health URL configured"));
            return WakeOutcome::Skipped;
        };

        let outcome = self
            .health
            .probe(health_url, policy.health_attempts, policy.health_interval())
            .await;

        if let ProbeOutcome::Unready { attempts } = outcome {
            tracing::warn!(attempts, "health endpoint never reported ready");
            self.output.write(OutputEvent::Warning(format!(
                "Server did not report ready after {} attempt(s); trying to connect anyway",
                attempts
            )));
        }
        outcome.into()
    }

    async fn grace(&self, wake: WakeOutcome, policy: &ConnectionAttemptPolicy) -> Option<Duration> {
        if !wake.polled() {
            self.step(StepEvent::new(Phase::Grace, StepStatus::Skipped));
            return None;
        }

        let grace = policy.post_health_grace();
        self.step(
            StepEvent::new(Phase::Grace, StepStatus::InProgress)
                .with_detail(format!("waiting {} for the server to initialize", format_elapsed(grace))),
        );
        tokio::time::sleep(grace).await;
        self.step(StepEvent::new(Phase::Grace, StepStatus::Success));
        Some(grace)
    }
}
