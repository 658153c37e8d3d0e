pub mod model;
pub mod scheduler;

use thiserror::Error;

/// Errors surfaced by the alarm core. Per-tick evaluation never returns
/// these; a malformed entry is skipped for that tick instead.
#[derive(Debug, Error)]
pub enum AlarmError {
    #[error("invalid time '{input}': {reason}")]
    InvalidTimeFormat { input: String, reason: &'static str },

    #[error("turn on at least one alarm with a valid time")]
    NoSchedulableAlarms,

    #[error("settings unavailable: {0}")]
    PersistenceUnavailable(String),

    #[error("session lock notifications unavailable: {0}")]
    SignalSourceUnavailable(String),
}
