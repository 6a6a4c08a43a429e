//! MCP client side
//!
//! Types and traits the connection lifecycle is written against, the
//! rmcp-backed streamable HTTP transport, and a scripted mock.

pub mod catalog;
#[cfg(feature = "http")]
mod client;
pub mod mock;
pub mod transport;
pub mod types;

pub use catalog::{fetch_catalog, CatalogError};
#[cfg(feature = "http")]
pub use client::RmcpClientFactory;
pub use transport::{
    ClientFactory, ConnectError, McpSession, SessionError, TransientKind, TransportClient,
};
pub use types::{
    Catalog, ContentItem, FailureKind, InvocationResult, ParamSchema, ParamType, ToolDescriptor,
    ToolOutput,
};
