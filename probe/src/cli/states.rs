//! Interaction loop states and the commands each one accepts

use serde_json::{Map, Value};
use thiserror::Error;

/// Where the interactive session is
#[derive(Debug, Clone, PartialEq)]
pub enum LoopState {
    /// No session yet
    Disconnected,
    /// Wake/grace/connect in progress
    Connecting,
    /// Looking at the tool list
    Browsing,
    /// One tool chosen (1-based catalog position)
    ToolSelected(usize),
    /// Asking for the chosen tool's parameters
    CollectingParameters(usize),
    /// Call in flight
    Invoking {
        tool: usize,
        arguments: Map<String, Value>,
    },
    /// Result on screen; next stop is the tool view
    ShowingResult(usize),
    Exiting,
}

impl Default for LoopState {
    fn default() -> Self {
        Self::Disconnected
    }
}

impl LoopState {
    /// Prompt shown while waiting for a command in this state
    pub fn prompt(&self) -> Option<&'static str> {
        match self {
            Self::Browsing => Some("Enter choice [number, l=list, v=logs, q=quit]: "),
            Self::ToolSelected(_) => Some("[r]un  [d]etails  [b]ack  [v] logs  [q]uit: "),
            Self::CollectingParameters(_) => Some("  → "),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Browsing => "browsing",
            Self::ToolSelected(_) => "tool-selected",
            Self::CollectingParameters(_) => "collecting-parameters",
            Self::Invoking { .. } => "invoking",
            Self::ShowingResult(_) => "showing-result",
            Self::Exiting => "exiting",
        }
    }

    pub fn is_exiting(&self) -> bool {
        matches!(self, Self::Exiting)
    }
}

/// Commands while browsing the tool list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseCommand {
    Select(usize),
    List,
    ToggleLogs,
    Quit,
}

/// Commands while a tool is selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCommand {
    Run,
    Details,
    Back,
    ToggleLogs,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Invalid tool number. Choose between 1 and {max}")]
    OutOfRange { max: usize },

    #[error("Invalid choice '{0}'. Enter a number, 'l' to list, or 'q' to quit")]
    UnknownBrowse(String),

    #[error("Invalid choice '{0}'. Enter r, d, b, v or q")]
    UnknownTool(String),
}

/// Typed at a parameter prompt to go back to the tool view
pub const ABORT_PARAMETERS: &str = "!back";

fn is_quit(input: &str) -> bool {
    matches!(input, "q" | "quit" | "exit")
}

pub fn parse_browse(input: &str, tool_count: usize) -> Result<BrowseCommand, CommandError> {
    let choice = input.trim().to_lowercase();

    match choice.as_str() {
        "" | "l" | "list" => return Ok(BrowseCommand::List),
        "v" => return Ok(BrowseCommand::ToggleLogs),
        c if is_quit(c) => return Ok(BrowseCommand::Quit),
        _ => {}
    }

    match choice.parse::<usize>() {
        Ok(n) if (1..=tool_count).contains(&n) => Ok(BrowseCommand::Select(n)),
        Ok(_) => Err(CommandError::OutOfRange { max: tool_count }),
        Err(_) => Err(CommandError::UnknownBrowse(input.trim().to_string())),
    }
}

pub fn parse_tool(input: &str) -> Result<ToolCommand, CommandError> {
    let choice = input.trim().to_lowercase();

    match choice.as_str() {
        "r" | "run" | "y" | "yes" => Ok(ToolCommand::Run),
        "d" | "details" => Ok(ToolCommand::Details),
        "b" | "back" | "n" | "no" => Ok(ToolCommand::Back),
        "v" => Ok(ToolCommand::ToggleLogs),
        c if is_quit(c) => Ok(ToolCommand::Quit),
        _ => Err(CommandError::UnknownTool(input.trim().to_string())),
    }
}
