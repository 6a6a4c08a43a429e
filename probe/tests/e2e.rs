//! End-to-end tests for mcp-probe
//!
//! Run with: cargo test --test e2e
//!
//! Test structure:
//! - connectivity: `--test` flow against the scripted transport
//! - session: interactive runs driven by scripted input
//! - health_endpoint: the reqwest health check against a local HTTP listener
//! - binary: the built `mcp-probe` executable (flags, exit codes)

#[path = "e2e/support.rs"]
mod support;

#[path = "e2e/connectivity.rs"]
mod connectivity;

#[path = "e2e/session.rs"]
mod session;

#[cfg(feature = "http")]
#[path = "e2e/health_endpoint.rs"]
mod health_endpoint;

#[path = "e2e/binary.rs"]
mod binary;
