/// Event listener registration methods
use crate::events::{Event, EventError};
use super::core::{EventSystem, DISCARD_PREFIX, PUBLISH_PREFIX, WILDCARD};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::info;

/// Listener invoked synchronously when an event is published or discarded.
///
/// Most users register closures through [`EventSystem::on_event_type`] and
/// friends rather than implementing this trait directly.
pub trait EventListener: Send + Sync + Debug + 'static {
    /// Handles a single event.
    fn handle(&self, event: &Event) -> Result<(), EventError>;

    /// Returns a human-readable name for this listener for debugging.
    fn listener_name(&self) -> &str;
}

/// Closure-backed [`EventListener`].
pub struct FnListener<F>
where
    F: Fn(&Event) -> Result<(), EventError> + Send + Sync,
{
    handler: F,
    name: String,
}

impl<F> FnListener<F>
where
    F: Fn(&Event) -> Result<(), EventError> + Send + Sync,
{
    pub fn new(name: String, handler: F) -> Self {
        Self { handler, name }
    }
}

impl<F> Debug for FnListener<F>
where
    F: Fn(&Event) -> Result<(), EventError> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnListener").field("name", &self.name).finish()
    }
}

impl<F> EventListener for FnListener<F>
where
    F: Fn(&Event) -> Result<(), EventError> + Send + Sync + 'static,
{
    fn handle(&self, event: &Event) -> Result<(), EventError> {
        (self.handler)(event)
    }

    fn listener_name(&self) -> &str {
        &self.name
    }
}

impl EventSystem {
    /// Registers a listener for events of one type, called on publish.
    pub fn on_event_type<F>(&self, type_key: &str, handler: F) -> Result<(), EventError>
    where
        F: Fn(&Event) -> Result<(), EventError> + Send + Sync + 'static,
    {
        let event_key = format!("{PUBLISH_PREFIX}{type_key}");
        self.register_listener(event_key, type_key, handler)
    }

    /// Registers a listener called on publish of any event type.
    pub fn on_any<F>(&self, handler: F) -> Result<(), EventError>
    where
        F: Fn(&Event) -> Result<(), EventError> + Send + Sync + 'static,
    {
        let event_key = format!("{PUBLISH_PREFIX}{WILDCARD}");
        self.register_listener(event_key, WILDCARD, handler)
    }

    /// Registers a listener called when an event of the given type (or `*`)
    /// is discarded.
    pub fn on_discard<F>(&self, type_key: &str, handler: F) -> Result<(), EventError>
    where
        F: Fn(&Event) -> Result<(), EventError> + Send + Sync + 'static,
    {
        let event_key = format!("{DISCARD_PREFIX}{type_key}");
        self.register_listener(event_key, type_key, handler)
    }

    /// Registers an already-built listener under a full registry key.
    pub fn register(&self, event_key: String, listener: Arc<dyn EventListener>) {
        info!(
            "📝 Registered listener '{}' for {}",
            listener.listener_name(),
            event_key
        );
        self.handlers.entry(event_key).or_default().push(listener);
    }

    fn register_listener<F>(
        &self,
        event_key: String,
        type_key: &str,
        handler: F,
    ) -> Result<(), EventError>
    where
        F: Fn(&Event) -> Result<(), EventError> + Send + Sync + 'static,
    {
        if type_key.is_empty() {
            return Err(EventError::Registration(
                "event type key must not be empty".to_string(),
            ));
        }

        let listener = FnListener::new(format!("{event_key}#listener"), handler);
        self.register(event_key, Arc::new(listener));
        Ok(())
    }
}
