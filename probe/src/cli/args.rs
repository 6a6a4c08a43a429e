//! CLI argument definitions

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::ConfigOverrides;

#[derive(Parser, Debug)]
#[command(name = "mcp-probe", version)]
#[command(about = "Interactive tester for remote MCP servers, including ones that sleep between requests")]
pub struct Cli {
    /// Test connectivity only: wake, connect, list tools, exit
    #[arg(short = 't', long = "test")]
    pub test: bool,

    /// Run the first-run setup wizard and write the global config file
    #[arg(long, conflicts_with = "test")]
    pub setup: bool,

    /// Config file to use instead of searching for .mcp-probe.toml
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// MCP server URL (default: from config file)
    #[arg(long, env = "MCP_SERVER_URL", value_name = "URL")]
    pub server_url: Option<String>,

    /// Bearer token for the MCP server
    #[arg(long, env = "MCP_TOKEN", value_name = "TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Health endpoint polled to wake a suspended server (wake-up is skipped when unset)
    #[arg(long, env = "MCP_HEALTH_URL", value_name = "URL")]
    pub health_url: Option<String>,

    /// Start with transport diagnostics visible (toggle at runtime with `v`)
    #[arg(long = "show-transport-logs", env = "MCP_VERBOSE")]
    pub show_transport_logs: bool,

    /// Disable colors
    #[arg(long)]
    pub plain: bool,

    /// Increase verbosity (-v info, -vv debug, -vvv trace). Default is warn.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            server_url: self.server_url.clone(),
            token: self.token.clone(),
            health_url: self.health_url.clone(),
            verbose: self.show_transport_logs,
        }
    }
}
