/// Event system module - container ownership, listener registry and dispatch
mod core;
mod emitters;
mod handlers;
mod stats;

pub use core::EventSystem;
pub use handlers::{EventListener, FnListener};
pub use stats::EventSystemStats;
