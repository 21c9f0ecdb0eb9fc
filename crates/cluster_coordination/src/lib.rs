//! # Cluster Coordination
//!
//! Quiescence and single-owner maintenance for Bastion clusters.
//!
//! - [`LatchableService`] / [`Latch`]: restrict new work and drain what is in flight
//! - [`WorkTracker`]: permit-based in-flight accounting that any service can embed
//! - [`DrainCoordinator`]: the drain, force-drain, fail protocol with cancellation
//! - [`ClusterLock`] / [`LockProvider`]: namespaced cluster-wide locks
//! - [`BootstrapLock`]: one-time startup work serialized across nodes
//! - [`MaintenanceRunner`]: lock, latch, drain, operate, unlatch, release
//!
//! ```rust
//! use cluster_coordination::*;
//!
//! let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
//! rt.block_on(async {
//!     let tracker = WorkTracker::new("search");
//!     let coordinator = DrainCoordinator::new();
//!
//!     coordinator
//!         .latch_and_drain(&tracker, LatchMode::RejectWrites, DrainTimeouts::new(5, 0))
//!         .await
//!         .unwrap();
//!     assert!(tracker.try_begin(WorkKind::Write).is_err());
//!
//!     coordinator.unlatch(&tracker).unwrap();
//!     assert!(tracker.try_begin(WorkKind::Write).is_ok());
//! });
//! ```

pub mod bootstrap;
pub mod config;
pub mod drain;
pub mod error;
pub mod latch;
pub mod local;
pub mod lock;
pub mod maintenance;
pub mod tracker;

pub use bootstrap::{BootstrapLock, BOOTSTRAP_LOCK_NAME};
pub use config::MaintenanceConfig;
pub use drain::{DrainCoordinator, DrainTimeouts};
pub use error::{CoordinationError, LockError, Result};
pub use latch::{DrainStatus, Latch, LatchMode, LatchableService};
pub use local::LocalLockProvider;
pub use lock::{namespaced, with_lock, with_lock_outcomes, ClusterLock, FailurePrecedence, LockOutcome, LockProvider};
pub use maintenance::MaintenanceRunner;
pub use tracker::{WorkKind, WorkPermit, WorkRejected, WorkTracker};
