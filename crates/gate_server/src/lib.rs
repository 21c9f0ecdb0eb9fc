//! # Gate Server
//!
//! HTTP front door for Bastion. Every request passes through an
//! [`AdmissionGate`] that consults the derived application state:
//!
//! 1. paths on the ignore-list (status, progress, the unavailable page,
//!    static assets) always pass
//! 2. with no blocking state (`MAINTENANCE`, `ERROR`, `STOPPING`) the request passes
//! 3. a valid bypass credential, given as a header or query parameter, passes
//! 4. anything else gets the configured 5xx with `Retry-After` and a small
//!    JSON body naming the state
//!
//! The gate only reads health state. It never publishes or discards events.
//!
//! ## Endpoints
//!
//! * `GET /status` - derived state and active events
//! * `GET /progress` - startup progress percentage and state
//! * `GET /unavailable` - the body served on rejection

pub use admission::{AdmissionGate, GateDecision, GateStats};
pub use config::{GateConfig, ServerConfig};
pub use error::ServerError;
pub use server::{GateServer, GateState};
pub use utils::{create_server, create_server_with_config};

pub mod admission;
pub mod config;
pub mod error;
pub mod server;
pub mod status;
pub mod utils;
