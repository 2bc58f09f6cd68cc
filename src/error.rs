//! Error types for the artifact delivery pipeline

use thiserror::Error;

/// Result type alias for delivery operations
pub type Result<T> = std::result::Result<T, DeliveryError>;

/// Error types that can occur in the delivery pipeline
#[derive(Error, Debug, Clone)]
pub enum DeliveryError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Artifact generation failed: {0}")]
    Generation(String),

    #[error("Cache IO error: {0}")]
    Io(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for DeliveryError {
    fn from(err: std::io::Error) -> Self {
        DeliveryError::Io(err.to_string())
    }
}

impl DeliveryError {
    /// Determine if this error must be collapsed into a silent 404 outcome
    ///
    /// `NotFound` and `AccessDenied` are the two provider-level conditions
    /// that must never be distinguishable from the outside: confirming that
    /// a resource exists but is forbidden tells a prober as much as serving
    /// it would. The distinction is kept for logging only.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            DeliveryError::NotFound(_) | DeliveryError::AccessDenied(_)
        )
    }

    /// Convert error to HTTP status code
    ///
    /// Maps internal errors to the status the outer web layer should emit:
    /// - `NotFound` / `AccessDenied`: 404, with no distinguishing detail
    /// - `Config`: 500 (should have failed at startup)
    /// - `Generation` / `Io` / `Internal`: 500
    /// - `Cancelled`: 499 (client went away)
    pub fn to_http_status(&self) -> u16 {
        match self {
            DeliveryError::NotFound(_) => 404,
            DeliveryError::AccessDenied(_) => 404,
            DeliveryError::Cancelled => 499,
            DeliveryError::Config(_) => 500,
            DeliveryError::Generation(_) => 500,
            DeliveryError::Io(_) => 500,
            DeliveryError::Internal(_) => 500,
        }
    }

    /// Classify a filesystem error observed while reading a source resource
    ///
    /// `NotFound` and `PermissionDenied` become the corresponding silent
    /// provider errors; anything else means the provider itself is
    /// misbehaving and surfaces as a `Generation` failure.
    pub fn from_source_io(err: std::io::Error, path: &str) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => DeliveryError::NotFound(path.to_string()),
            std::io::ErrorKind::PermissionDenied => DeliveryError::AccessDenied(path.to_string()),
            _ => DeliveryError::Generation(format!("{}: {}", path, err)),
        }
    }
}
