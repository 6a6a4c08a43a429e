//! Command handlers
//!
//! `ProbeContext` carries what every mode needs: resolved config, the output
//! sink, the shared logging switch and the transport/health seams.

use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;

use crate::config::ProbeConfig;
use crate::connect::{ConnectionEstablisher, HealthEndpoint};
use crate::logging::LoggingState;
use crate::mcp::ClientFactory;
use crate::output::OutputWriter;

pub mod connectivity;
pub mod interactive;
pub mod setup;

pub use connectivity::run_connectivity_test;
pub use interactive::run_interactive;
pub use setup::run_setup;

/// How a run ended, mapped onto the process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    /// Connection or catalog failure
    Failed,
    /// Ctrl-C
    Interrupted,
}

impl RunOutcome {
    pub fn code(self) -> u8 {
        match self {
            Self::Success | Self::Interrupted => 0,
            Self::Failed => 1,
        }
    }

    pub fn exit_code(self) -> ExitCode {
        ExitCode::from(self.code())
    }
}

/// Shared state for the handlers
pub struct ProbeContext {
    pub config: ProbeConfig,
    pub output: Arc<dyn OutputWriter>,
    pub logging: LoggingState,
    pub factory: Arc<dyn ClientFactory>,
    pub health: Arc<dyn HealthEndpoint>,
}

impl ProbeContext {
    pub fn new(
        config: ProbeConfig,
        output: Arc<dyn OutputWriter>,
        logging: LoggingState,
        factory: Arc<dyn ClientFactory>,
        health: Arc<dyn HealthEndpoint>,
    ) -> Self {
        Self {
            config,
            output,
            logging,
            factory,
            health,
        }
    }

    /// Production seams: rmcp over streamable HTTP and a reqwest health check
    #[cfg(feature = "http")]
    pub fn http(
        config: ProbeConfig,
        output: Arc<dyn OutputWriter>,
        logging: LoggingState,
    ) -> anyhow::Result<Self> {
        use anyhow::Context;

        let health =
            crate::connect::HttpHealthEndpoint::new().context("Failed to build HTTP client")?;
        Ok(Self::new(
            config,
            output,
            logging,
            Arc::new(crate::mcp::RmcpClientFactory),
            Arc::new(health),
        ))
    }

    pub fn establisher(&self) -> ConnectionEstablisher {
        ConnectionEstablisher::new(
            self.factory.clone(),
            self.health.clone(),
            self.output.clone(),
        )
    }
}

/// Resolves when the user presses Ctrl-C; never, if the handler can't be installed
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// A future that never resolves, for runs that can't be interrupted
pub fn never() -> impl Future<Output = ()> {
    std::future::pending()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::config::{ConnectionAttemptPolicy, LoggingConfig, ServerEndpoint};
    use crate::mcp::mock::MockClientFactory;
    use crate::output::CaptureOutput;
    use async_trait::async_trait;

    /// Health endpoint that is never consulted without a health URL
    pub struct NoHealth;

    #[async_trait]
    impl HealthEndpoint for NoHealth {
        async fn check(&self, _url: &str) -> Result<u16, String> {
            Err("not configured".into())
        }
    }

    pub fn context(factory: &MockClientFactory, output: &CaptureOutput) -> ProbeContext {
        let config = ProbeConfig {
            endpoint: ServerEndpoint::new("http://mcp.test/mcp", "token"),
            policy: ConnectionAttemptPolicy::default(),
            logging: LoggingConfig::default(),
            source: None,
        };
        ProbeContext::new(
            config,
            Arc::new(output.clone()),
            LoggingState::new(false),
            Arc::new(factory.clone()),
            Arc::new(NoHealth),
        )
    }
}
