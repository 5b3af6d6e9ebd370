//! Error types for Marga

use std::time::Duration;

use crate::provider::ProviderState;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Marga error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Route map could not produce segments or rejected a routing update
    #[error("Route map error: {0}")]
    Adapter(String),

    /// Vehicle position could not be projected onto a route segment
    #[error("Projection failed: {0}")]
    Projection(String),

    /// Smoothing strategy could not produce a path
    #[error("Smoothing failed: {0}")]
    Smoothing(String),

    /// Smoothed path deviates too far from the raw path
    #[error("Smoothed line deviates {diff:.3}m from raw line at s={s:.1}m")]
    Validation {
        /// Arc length of the offending sample
        s: f64,
        /// Planar distance between raw and smoothed points
        diff: f64,
    },

    /// Every candidate segment was rejected in this cycle
    #[error("No smooth reference lines available")]
    EmptyResult,

    /// Provider used before `init`
    #[error("Reference line provider has not been initialized")]
    NotInitialized,

    /// Lifecycle operation not valid in the current state
    #[error("Cannot {operation} while provider is {state:?}")]
    InvalidState {
        /// State the provider was in
        state: ProviderState,
        /// Rejected operation
        operation: &'static str,
    },

    /// No routing result has been accepted yet
    #[error("Routing is not ready")]
    RoutingNotReady,

    /// No snapshot was published within the wait budget
    #[error("No reference lines published within {0:?}")]
    Timeout(Duration),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
