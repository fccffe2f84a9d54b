//! Error types for the espeasy library.

use thiserror::Error;

/// The main error type for espeasy operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP transport error (connection refused, timeout, DNS, ...).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Device answered with a non-success HTTP status.
    #[error("device returned HTTP status {status}")]
    Status { status: u16 },

    /// Response body was not the JSON the endpoint is documented to return.
    #[error("invalid JSON in response: {0}")]
    Json(#[from] serde_json::Error),

    /// Response parsed but did not match the expected shape.
    #[error("unexpected response: {message}")]
    UnexpectedResponse { message: String },

    /// No status document cached yet; `connect` or `refresh` first.
    #[error("not connected")]
    NotConnected,

    /// Registry has no entry for the requested IP or name.
    #[error("no registered unit matches {query:?}")]
    EspNotFound { query: String },

    /// The unit reports no task with this name.
    #[error("no task named {name:?} on {host}")]
    TaskNotFound { name: String, host: String },

    /// The task has no value with this name.
    #[error("task {task:?} has no value named {value:?}")]
    ValueNotFound { task: String, value: String },

    /// Task type string has no device wrapper.
    #[error("no device wrapper for task type {task_type:?}")]
    UnknownTaskType { task_type: String },

    /// GPIO devices need a pin number in their settings.
    #[error("device {name:?} has no GPIO pin configured")]
    MissingPin { name: String },

    /// Not a parseable `a.b.c.d/prefix` IPv4 network.
    #[error("invalid IPv4 network {input:?}")]
    InvalidNetwork { input: String },

    /// Registry operations key on IP addresses.
    #[error("invalid IP address {input:?}")]
    InvalidAddress { input: String },

    /// Package configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Saved-settings (de)serialization error.
    #[error("settings error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for espeasy operations.
pub type Result<T> = std::result::Result<T, Error>;
