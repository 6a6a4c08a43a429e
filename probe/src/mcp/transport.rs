//! Transport seam
//!
//! The connection lifecycle is written against these traits only. The
//! production implementation lives in `client` (rmcp over streamable HTTP);
//! `mock` provides a scripted double for tests.

use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use super::types::{ToolDescriptor, ToolOutput};
use crate::config::ServerEndpoint;

/// Failure modes that are worth another attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientKind {
    BrokenResource,
    ClosedResource,
    Timeout,
    ConnectionRefused,
    ConnectionReset,
    SendFailed,
    /// 502/503/504 from a proxy while the backend resumes
    Gateway,
}

impl fmt::Display for TransientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BrokenResource => "broken resource",
            Self::ClosedResource => "closed resource",
            Self::Timeout => "timeout",
            Self::ConnectionRefused => "connection refused",
            Self::ConnectionReset => "connection reset",
            Self::SendFailed => "send failed",
            Self::Gateway => "gateway unavailable",
        };
        f.write_str(s)
    }
}

/// Classified failure of a single connect attempt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// Server not ready yet; retried per policy
    #[error("{kind}: {message}")]
    Transient { kind: TransientKind, message: String },

    /// Credentials refused; never retried
    #[error("rejected by server: {0}")]
    Rejected(String),

    /// Anything else (malformed response, unsupported protocol); never retried
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl ConnectError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    pub fn timeout(after: Duration) -> Self {
        Self::Transient {
            kind: TransientKind::Timeout,
            message: format!("no initialize response within {}s", after.as_secs()),
        }
    }

    /// Map an HTTP status onto a connect failure; `None` for statuses that
    /// say nothing about retrying
    pub fn from_status(status: u16, message: &str) -> Option<Self> {
        match status {
            401 | 403 => Some(Self::Rejected(message.to_string())),
            502..=504 => Some(Self::Transient {
                kind: TransientKind::Gateway,
                message: message.to_string(),
            }),
            _ => None,
        }
    }

    /// Classify a transport error from its rendered chain (`outer: inner: root`).
    ///
    /// Request URLs are removed before matching, so digits in a host or
    /// port are never read as a status. Status codes only count next to
    /// status context (`status: 401`, `HTTP 503`, `403 Forbidden`). Auth
    /// failures win over everything else so a 401 is never retried.
    pub fn classify(message: &str) -> Self {
        let stripped = URL_SEGMENT.replace_all(message, " ");
        let lower = stripped.to_lowercase();

        if let Some(err) = status_in(&lower).and_then(|s| Self::from_status(s, message)) {
            return err;
        }

        let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

        if has(&["unauthorized", "forbidden", "invalid token"]) {
            return Self::Rejected(message.to_string());
        }

        let kind = if has(&["brokenresource", "broken resource", "broken pipe"]) {
            Some(TransientKind::BrokenResource)
        } else if has(&[
            "closedresource",
            "closed resource",
            "connection closed",
            "channel closed",
        ]) {
            Some(TransientKind::ClosedResource)
        } else if has(&["bad gateway", "service unavailable", "gateway timeout"]) {
            Some(TransientKind::Gateway)
        } else if has(&["timed out", "timeout"]) {
            Some(TransientKind::Timeout)
        } else if has(&["connection refused"]) {
            Some(TransientKind::ConnectionRefused)
        } else if has(&["connection reset"]) {
            Some(TransientKind::ConnectionReset)
        } else if has(&["error sending request", "transport send error", "tcp connect"]) {
            Some(TransientKind::SendFailed)
        } else {
            None
        };

        match kind {
            Some(kind) => Self::Transient {
                kind,
                message: message.to_string(),
            },
            None => Self::Protocol(message.to_string()),
        }
    }
}

/// reqwest's `for url (...)` segment, and any bare URL
static URL_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)for url \([^)]*\)|\b[a-z][a-z0-9+.-]*://[^\s)]+").expect("static pattern")
});

/// `status: 401`, `status code 503`, `HTTP/1.1 502`, `HTTP 401`
static STATUS_PREFIXED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:status(?:\s+code)?|http(?:/[0-9.]+)?)\s*[:=]?\s*([1-5][0-9]{2})\b")
        .expect("static pattern")
});

/// `401 Unauthorized`, `503 Service Unavailable`
static STATUS_REASON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b([45][0-9]{2})\s+(?:unauthorized|forbidden|bad gateway|service unavailable|gateway time-?out)\b",
    )
    .expect("static pattern")
});

/// First status code stated with status context in a lowercased, URL-free message
fn status_in(lower: &str) -> Option<u16> {
    [&*STATUS_PREFIXED, &*STATUS_REASON]
        .iter()
        .find_map(|re| re.captures(lower))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Failure of a request on an established session
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("session is closed")]
    Closed,
}

/// A live connection to one server
#[async_trait]
pub trait McpSession: Send + Sync {
    /// Retrieve the tool manifest
    async fn list_tools(&self) -> Result<Vec<ToolDescriptor>, SessionError>;

    /// Invoke a tool. `arguments` contains only the parameters the user supplied.
    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolOutput, SessionError>;

    /// Tear the session down
    async fn close(self: Box<Self>);
}

/// One connect attempt's worth of client state.
///
/// `connect` consumes the client, so a client that failed once can never be
/// handed a second attempt.
#[async_trait]
pub trait TransportClient: Send {
    async fn connect(
        self: Box<Self>,
        endpoint: &ServerEndpoint,
    ) -> Result<Box<dyn McpSession>, ConnectError>;
}

/// Produces a fresh `TransportClient` for every attempt
pub trait ClientFactory: Send + Sync {
    fn create(&self) -> Box<dyn TransportClient>;
}
