//! Tool catalog retrieval
//!
//! One request, one timeout, no retry: a manifest failure right after a
//! successful connect is not something another attempt will fix.

use std::time::{Duration, Instant};

use thiserror::Error;

use super::transport::{McpSession, SessionError};
use super::types::Catalog;
use crate::logging::format_elapsed;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("tool manifest not received within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("failed to list tools: {0}")]
    Failed(#[from] SessionError),
}

/// Fetch the tool manifest from a live session
pub async fn fetch_catalog(
    session: &dyn McpSession,
    timeout: Duration,
) -> Result<Catalog, CatalogError> {
    let started = Instant::now();

    let tools = tokio::time::timeout(timeout, session.list_tools())
        .await
        .map_err(|_| CatalogError::Timeout(timeout))??;

    tracing::debug!(
        tools = tools.len(),
        "tools/list: {}",
        format_elapsed(started.elapsed())
    );

    Ok(Catalog::new(tools))
}
