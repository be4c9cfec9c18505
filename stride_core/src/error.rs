//! Error types for the stride_core library.

use std::io;
use uuid::Uuid;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for stride_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A workout was started without any intervals
    #[error("Cannot start a workout with no intervals")]
    EmptyWorkout,

    /// The timer has already been started once
    #[error("Timer already started")]
    TimerAlreadyStarted,

    /// `initialise` was called while a plan already exists
    #[error("A training plan already exists; reset it first")]
    PlanAlreadyInitialised,

    /// No session in the plan has this id
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
