//! Wake-up polling against a readiness endpoint
//!
//! Suspended platforms resume on the first inbound request, so the probe
//! keeps asking until it sees a 2xx or runs out of attempts.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::logging::format_elapsed;
use crate::output::{OutputEvent, OutputWriter, Phase, StepEvent, StepStatus};

/// Something that answers a readiness check with an HTTP status
#[async_trait]
pub trait HealthEndpoint: Send + Sync {
    /// Status code of one request, or a description of why none came back
    async fn check(&self, url: &str) -> Result<u16, String>;
}

/// reqwest-backed health check
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpHealthEndpoint {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpHealthEndpoint {
    /// Per-request timeout; a cold start can take a while to answer at all
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl HealthEndpoint for HttpHealthEndpoint {
    async fn check(&self, url: &str) -> Result<u16, String> {
        match self.client.get(url).send().await {
            Ok(response) => Ok(response.status().as_u16()),
            Err(e) if e.is_timeout() => Err("request timed out".to_string()),
            Err(e) if e.is_connect() => Err(format!("connection failed: {}", e)),
            Err(e) => Err(e.to_string()),
        }
    }
}

/// Result of a full polling run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Ready { attempts: u32 },
    Unready { attempts: u32 },
}

/// Polls a health endpoint, reporting each attempt as a wake step
pub struct HealthProbe {
    endpoint: Arc<dyn HealthEndpoint>,
    output: Arc<dyn OutputWriter>,
}

impl HealthProbe {
    pub fn new(endpoint: Arc<dyn HealthEndpoint>, output: Arc<dyn OutputWriter>) -> Self {
        Self { endpoint, output }
    }

    fn step(&self, status: StepStatus, detail: String) {
        self.output
            .write(OutputEvent::Step(StepEvent::new(Phase::Wake, status).with_detail(detail)));
    }

    /// Up to `attempts` requests, `interval` apart. Stops at the first 2xx.
    ///
    /// Network errors count as failed attempts. The wait happens only
    /// between attempts, never after the last one.
    pub async fn probe(&self, url: &str, attempts: u32, interval: Duration) -> ProbeOutcome {
        for attempt in 1..=attempts {
            self.step(
                StepStatus::InProgress,
                format!("attempt {}/{} ({})", attempt, attempts, url),
            );

            let started = Instant::now();
            let result = self.endpoint.check(url).await;
            tracing::debug!(
                attempt,
                "health check: {}",
                format_elapsed(started.elapsed())
            );

            match result {
                Ok(status) if (200..300).contains(&status) => {
                    self.step(
                        StepStatus::Success,
                        format!("server is awake (status {})", status),
                    );
                    return ProbeOutcome::Ready { attempts: attempt };
                }
                Ok(status) => {
                    self.step(
                        StepStatus::Failed,
                        format!("server responded with status {}", status),
                    );
                }
                Err(reason) => {
                    tracing::debug!(attempt, %reason, "health check failed");
                    self.step(StepStatus::Failed, reason);
                }
            }

            if attempt < attempts {
                tokio::time::sleep(interval).await;
            }
        }

        ProbeOutcome::Unready { attempts }
    }
}
