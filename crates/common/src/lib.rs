//! Shared service contract for the Tickets P2P workspace.
//!
//! The backend serializes these types and the smoke harness checks
//! responses against the same literals, so both sides agree on the wire
//! shape of the health report.

#[cfg(feature = "shutdown")]
pub mod shutdown;
pub mod types;

pub use types::{
    API_DESCRIPTION, API_TITLE, API_VERSION, DATABASE_CONNECTED, DEFAULT_BACKEND_PORT,
    DEFAULT_FRONTEND_PORT, DatabaseStatus, HealthReport, PRODUCT_NAME, STATUS_HEALTHY,
};

#[cfg(feature = "shutdown")]
pub use shutdown::shutdown_signal;
