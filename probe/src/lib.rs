//! Interactive tester for remote MCP servers that may be suspended between requests

pub mod cli;
pub mod config;
pub mod connect;
pub mod handlers;
pub mod logging;
pub mod mcp;
pub mod output;
pub mod params;
