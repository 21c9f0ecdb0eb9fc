//! Single-owner maintenance runs: lock, latch and drain, operate, restore.

use crate::config::MaintenanceConfig;
use crate::drain::DrainCoordinator;
use crate::error::{CoordinationError, Result};
use crate::latch::LatchableService;
use crate::lock::{with_lock, LockProvider};
use bastion_event_system::{types, Event, EventLevel, EventSystem, EventType, HealthSystem};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Runs maintenance tasks such as upgrades, restores and reindexing.
///
/// While a task runs a maintenance-level event is published, so the derived
/// application state reports `MAINTENANCE` and the admission gate turns
/// ordinary traffic away. A failed task leaves an error-level event behind
/// for an operator to inspect and discard.
#[derive(Debug)]
pub struct MaintenanceRunner {
    events: Arc<EventSystem>,
    maintenance_level: EventLevel,
    error_level: EventLevel,
    provider: Arc<dyn LockProvider>,
    coordinator: DrainCoordinator,
    config: MaintenanceConfig,
}

impl MaintenanceRunner {
    pub fn new(health: &HealthSystem, provider: Arc<dyn LockProvider>, config: MaintenanceConfig) -> Self {
        Self {
            events: health.events.clone(),
            maintenance_level: health.level(&health.config.maintenance_level),
            error_level: health.level(&health.config.error_level),
            provider,
            coordinator: DrainCoordinator::new(),
            config,
        }
    }

    /// The drain coordinator for this runner. Call `cancel` on it to abort.
    ///
    /// A cancel request is consumed by the next run, whether it interrupts a
    /// drain or stops the run before its operation starts.
    pub fn coordinator(&self) -> &DrainCoordinator {
        &self.coordinator
    }

    /// Runs `operation` as maintenance task `task`.
    ///
    /// The lock named `task` is held for the whole run. Services are latched
    /// and drained in order; the first one that fails to drain stops the run
    /// and stays latched.
    pub async fn run<F, Fut, T>(
        &self,
        task: &str,
        services: &[Arc<dyn LatchableService>],
        operation: F,
    ) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let lock = self.provider.get_lock(task);
        info!("🔧 Starting maintenance task '{}' ({} service(s))", task, services.len());

        let result = with_lock(lock.as_ref(), self.config.failure_precedence, move || {
            self.drain_and_run(task, services, operation)
        })
        .await;
        self.coordinator.take_cancel_request();

        match &result {
            Ok(_) => info!("✅ Maintenance task '{}' completed", task),
            Err(e) => self.report_failure(task, e),
        }
        result
    }

    async fn drain_and_run<F, Fut, T>(
        &self,
        task: &str,
        services: &[Arc<dyn LatchableService>],
        operation: F,
    ) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let notice = Event::new(
            EventType::with_description(types::MAINTENANCE, task),
            format!("Maintenance task '{task}' in progress"),
            self.maintenance_level.clone(),
        );
        self.events.publish(notice.clone());

        let result = self.latched_run(task, services, operation).await;

        self.events.discard(&notice);
        result
    }

    async fn latched_run<F, Fut, T>(
        &self,
        task: &str,
        services: &[Arc<dyn LatchableService>],
        operation: F,
    ) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut latched: Vec<&Arc<dyn LatchableService>> = Vec::with_capacity(services.len());

        for service in services {
            let drained = self
                .coordinator
                .latch_and_drain(service.as_ref(), self.config.latch_mode, self.config.drain)
                .await;

            if let Err(e) = drained {
                if e.is_cancelled() {
                    latched.push(service);
                }
                self.unlatch_all(&latched);
                return Err(e);
            }
            latched.push(service);
        }

        if self.coordinator.take_cancel_request() {
            warn!("🛑 Maintenance task '{}' cancelled before it started", task);
            self.unlatch_all(&latched);
            return Err(CoordinationError::Cancelled {
                service: task.to_string(),
            });
        }

        let result = operation().await;
        self.unlatch_all(&latched);
        result
    }

    fn unlatch_all(&self, services: &[&Arc<dyn LatchableService>]) {
        for service in services {
            if let Err(e) = self.coordinator.unlatch(service.as_ref()) {
                warn!("⚠️ Could not unlatch '{}': {}", service.service_name(), e);
            }
        }
    }

    fn report_failure(&self, task: &str, err: &CoordinationError) {
        error!("❌ Maintenance task '{}' failed: {}", task, err);
        self.events.publish(Event::new(
            EventType::with_description(types::MAINTENANCE, task),
            format!("Maintenance task '{task}' failed: {err}"),
            self.error_level.clone(),
        ));
    }
}
