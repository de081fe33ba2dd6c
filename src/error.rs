//! Error types for workload
//!
//! Centralized error handling using thiserror. Configuration errors surface
//! before any ticking begins; per-tick errors are logged and counted by the
//! scheduler and never stop it.

use thiserror::Error;

/// All error types that can occur while building or running a workload
#[derive(Debug, Error)]
pub enum WorkloadError {
    /// A request weight is zero, negative, NaN or infinite, or there was
    /// nothing to choose from
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),

    /// The set of request templates cannot drive a scheduler
    #[error("Invalid template set: {0}")]
    InvalidTemplateSet(String),

    /// The requests-per-minute rate is not a positive finite number
    #[error("Invalid rate: {0}")]
    InvalidRate(String),

    /// Malformed brace-expansion syntax in a URL
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// Invalid state transition or operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A one-line request descriptor or header argument could not be parsed
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// Configuration could not be resolved
    #[error("Config error: {0}")]
    Config(String),

    /// A filter step failed for reasons of its own
    #[error("Filter error: {0}")]
    Filter(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// CSV decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type alias for workload operations
pub type Result<T> = std::result::Result<T, WorkloadError>;
