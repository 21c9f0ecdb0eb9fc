//! HTTP server wiring: router, admission middleware and lifecycle.

pub mod core;
pub mod handlers;

pub use core::GateServer;
pub use handlers::GateState;
