//! Error types for FormFlow.

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Field catalog validation errors. All of these indicate a
/// misconfigured catalog and are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog has no fields")]
    Empty,

    #[error("Duplicate field id: {0}")]
    DuplicateFieldId(String),

    #[error("List-picker field {0} has no options")]
    MissingOptions(String),

    #[error("Text field {0} must not carry options")]
    UnexpectedOptions(String),

    #[error("Field index {index} out of range for catalog of {len} fields")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Flow lifecycle errors surfaced to callers (webhook handler, REST
/// control surface). Invalid answers are not errors; they are
/// re-prompt decisions consumed inside the flow.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("No active flow for conversation {conversation_id}")]
    NotFound { conversation_id: String },

    #[error("Flow already active for conversation {conversation_id}")]
    AlreadyExists { conversation_id: String },
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Channel health check failed: {name}")]
    HealthCheckFailed { name: String },

    #[error("No channel registered under name {0}")]
    UnknownChannel(String),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
