//! Getting from "configured" to "live session"

pub mod establish;
pub mod health;

pub use establish::{
    ConnectionEstablisher, ConnectionFailure, EstablishReport, Established, WakeOutcome,
};
#[cfg(feature = "http")]
pub use health::HttpHealthEndpoint;
pub use health::{HealthEndpoint, HealthProbe, ProbeOutcome};
