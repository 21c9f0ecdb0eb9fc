//! # Bastion Event System
//!
//! Health event aggregation and application state derivation for the Bastion
//! server.
//!
//! ## Core Features
//!
//! - **Copy-on-write event container**: readers never block and never observe a
//!   partially applied publish
//! - **Configurable severity order**: a fixed ranking of level keys, most severe first
//! - **Health advice**: "what is the most severe active event?" in O(n)
//! - **State derivation**: one authoritative [`ApplicationState`] recomputed per call
//! - **Typed listener registry**: closures registered per event type, called directly
//!
//! ## Data Flow
//!
//! ```text
//! subsystem ──publish──▶ EventSystem ──▶ EventContainer
//!                             │                │
//!                       listeners        HealthAdvisor ──▶ ApplicationStateMachine
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use bastion_event_system::*;
//! use std::sync::Arc;
//!
//! let health = create_health_system(HealthConfig::default(), Arc::new(SetupFlag::new(true)));
//! health.state.mark_running();
//!
//! health.events.on_event_type(types::DATABASE, |event: &Event| {
//!     println!("database problem: {}", event.message());
//!     Ok(())
//! }).expect("register listener");
//!
//! health.events.publish(Event::new(
//!     EventType::new(types::DATABASE),
//!     "Connection refused",
//!     health.level(levels::ERROR),
//! ));
//!
//! assert_eq!(health.state.get_state(), ApplicationState::Error);
//! ```

pub mod api;
pub mod config;
pub mod container;
pub mod events;
pub mod lifecycle;
pub mod severity;
pub mod state;
pub mod system;

pub use api::{create_health_system, HealthSystem};
pub use config::HealthConfig;
pub use container::{EventContainer, EventSnapshot};
pub use events::{levels, types, Event, EventError, EventLevel, EventType};
pub use lifecycle::{LifecycleFlag, ProgressSnapshot, StartupProgress};
pub use severity::{HealthAdvisor, SeverityOrder};
pub use state::{ApplicationState, ApplicationStateMachine, SetupFlag, SetupStatus, StateThresholds};
pub use system::{EventListener, EventSystem, EventSystemStats, FnListener};
