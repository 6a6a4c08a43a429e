//! Output abstraction for the probe
//!
//! The connection lifecycle and the interactive loop emit `OutputEvent`s;
//! how they look on screen is up to the `OutputWriter`. Terminal output gets
//! colors, pipes and CI get plain text, tests capture events.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::mcp::{Catalog, InvocationResult, ParamSchema, ToolDescriptor};

mod capture;
mod plain;
mod render;
mod terminal;

pub use capture::CaptureOutput;
pub use plain::PlainOutput;
pub use terminal::TerminalOutput;

// ============================================================================
// Step Events
// ============================================================================

/// Phase of connection bring-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Polling the health endpoint
    Wake,
    /// Fixed wait after wake-up
    Grace,
    /// One connect attempt
    Connect { attempt: u32, total: u32 },
    /// Fetching the tool manifest
    Catalog,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wake => f.write_str("Wake-up"),
            Self::Grace => f.write_str("Initialization grace"),
            Self::Connect { attempt, total } => write!(f, "Connect ({}/{})", attempt, total),
            Self::Catalog => f.write_str("Tool catalog"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    InProgress,
    Success,
    /// Not needed (e.g. no health URL configured); distinct from success
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepEvent {
    pub phase: Phase,
    pub status: StepStatus,
    pub detail: Option<String>,
}

impl StepEvent {
    pub fn new(phase: Phase, status: StepStatus) -> Self {
        Self {
            phase,
            status,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// ============================================================================
// Output Events
// ============================================================================

/// Events that can be displayed to the user
#[derive(Debug, Clone)]
pub enum OutputEvent {
    /// Plain text message
    Text(String),

    /// Section header
    Banner(String),

    /// Connection bring-up progress
    Step(StepEvent),

    /// Numbered tool list
    ToolList(Catalog),

    /// Schema of one tool
    ToolDetail(ToolDescriptor),

    /// Asking for one parameter value
    ParameterPrompt(ParamSchema),

    /// Tool call about to be sent
    ToolStart { name: String, arguments: Value },

    /// Outcome of a tool call
    ToolResult {
        name: String,
        result: InvocationResult,
    },

    /// Input prompt, no trailing newline
    Prompt(String),

    /// Status message (informational)
    Status(String),

    /// Error message
    Error(String),

    /// Warning message
    Warning(String),

    /// System message (dimmed, for internal info)
    System(String),

    /// New line / separator
    NewLine,
}

// ============================================================================
// Output Writer Trait
// ============================================================================

/// Trait for writing output events
pub trait OutputWriter: Send + Sync {
    /// Write an output event
    fn write(&self, event: OutputEvent);

    /// Flush any buffered output
    fn flush(&self);

    /// Whether this writer supports colors/formatting
    fn supports_colors(&self) -> bool {
        false
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Pick a writer: colors on a terminal unless `plain` is requested
pub fn default_output(plain: bool) -> Arc<dyn OutputWriter> {
    if !plain && atty::is(atty::Stream::Stdout) {
        Arc::new(TerminalOutput::new())
    } else {
        Arc::new(PlainOutput::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_labels() {
        assert_eq!(Phase::Wake.to_string(), "Wake-up");
        assert_eq!(
            Phase::Connect {
                attempt: 2,
                total: 3
            }
            .to_string(),
            "Connect (2/3)"
        );
    }

    #[test]
    fn test_step_event_detail() {
        let step = StepEvent::new(Phase::Grace, StepStatus::InProgress).with_detail("20s");
        assert_eq!(step.detail.as_deref(), Some("20s"));
        assert_ne!(StepStatus::Skipped, StepStatus::Success);
    }

    #[test]
    fn test_plain_default_when_requested() {
        let output = default_output(true);
        assert!(!output.supports_colors());
    }
}
