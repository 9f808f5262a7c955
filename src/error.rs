//! Error types for the telemetry pipeline

use thiserror::Error;

/// Invalid generation request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("record count must be greater than zero")]
    ZeroCount,
    #[error("record count {requested} exceeds the maximum of {max}")]
    TooManyRecords { requested: usize, max: usize },
    #[error("either classUid or scenarioId must be set")]
    MissingMode,
    #[error("classUid and scenarioId are mutually exclusive")]
    AmbiguousMode,
    #[error("unknown class uid: {0}")]
    UnknownClass(u32),
    #[error("unknown scenario: {0}")]
    UnknownScenario(String),
}

/// Terminal failure of a generation stream
///
/// Both variants end the stream the same way; the distinction only matters
/// for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The producer sent an explicit `error` message
    #[error("{0}")]
    Producer(String),
    /// The producer context faulted, died, or the channel closed
    #[error("producer context failure: {0}")]
    Transport(String),
}

impl GenerationError {
    pub fn is_transport(&self) -> bool {
        matches!(self, GenerationError::Transport(_))
    }
}

/// Failure raised by a record generator for a single record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct GeneratorError(pub String);

impl GeneratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Invalid configuration value
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}
