/// Error types for Mist
///
/// Day-to-day failures (bad frames, missing data, render failures, dropped
/// sends) are recovered locally by their callers; these types carry the
/// condition to the place where it is logged.
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum MistError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Message codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("Only component updates can be broadcast, got '{kind}'")]
    InvalidBroadcast { kind: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the data store collaborator
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Record of model '{model}' has no id")]
    MissingId { model: &'static str },

    #[error("Record {id} of model '{model}' not found")]
    NotFound { model: &'static str, id: Uuid },

    #[error("Stored id '{0}' is not a valid UUID")]
    InvalidId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the template renderer collaborator
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template '{0}' not found")]
    TemplateNotFound(String),

    #[error("Template '{template}' references missing value '{path}'")]
    MissingBinding { template: String, path: String },

    #[error("Template '{template}' cannot print '{path}' (not a scalar)")]
    NotPrintable { template: String, path: String },

    #[error("Failed to read template '{name}': {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config already initialized")]
    AlreadyInitialized,
}
