//! Error types for Feedsweep
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

use crate::view::ViewError;

/// All error types that can occur in Feedsweep
#[derive(Debug, Error)]
pub enum SweepError {
    /// The view rejected or failed an interaction
    #[error("View error: {0}")]
    View(#[from] ViewError),

    /// Invalid settings
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for Feedsweep operations
pub type Result<T> = std::result::Result<T, SweepError>;
