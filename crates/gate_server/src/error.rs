//! Error types for the gate server.

/// Enumeration of possible server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Binding or serving failures
    #[error("Network error: {0}")]
    Network(String),

    /// Settings rejected before the server started
    #[error("Configuration error: {0}")]
    Configuration(String),
}
