//! Error types for the upload-to-cutout pipeline

use thiserror::Error;

/// Result type alias for upload operations
pub type Result<T> = std::result::Result<T, CutoutError>;

/// Reasons a file is refused before any work is done
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Declared MIME type is not `image/*`
    #[error("Unsupported file type '{mime}': only image/* files are accepted")]
    UnsupportedType { mime: String },

    /// Declared size exceeds the configured upload limit
    #[error("File too large: {size} bytes (limit: {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },
}

/// Failure while reading a file's content into memory
#[derive(Error, Debug)]
#[error("Failed to read '{name}': {source}")]
pub struct DecodeError {
    /// Display name of the file that could not be read
    pub name: String,
    #[source]
    pub source: std::io::Error,
}

impl DecodeError {
    pub fn new<S: Into<String>>(name: S, source: std::io::Error) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }
}

/// Failures of the background removal step
#[derive(Error, Debug)]
pub enum RemovalError {
    /// Transport-level failure talking to the removal service
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("{message}")]
    Service {
        status: Option<u16>,
        message: String,
    },

    /// No usable credential is configured. Selects the mock path, never surfaced.
    #[error("No API key configured")]
    ConfigMissing,
}

impl RemovalError {
    /// Create a service error for an HTTP status
    pub fn service<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Service {
            status: Some(status),
            message: message.into(),
        }
    }

    /// HTTP status attached to the failure, if any
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            Self::Service { status, .. } => *status,
            Self::ConfigMissing => None,
        }
    }
}

/// Top-level error for everything `handle_upload` can report
#[derive(Error, Debug)]
pub enum CutoutError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Background removal failed: {0}")]
    Removal(#[from] RemovalError),

    /// Another upload is still in flight
    #[error("An upload is already in progress")]
    Busy,

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Malformed image representation (e.g. a broken data URI)
    #[error("Invalid image: {0}")]
    InvalidImage(String),
}

impl CutoutError {
    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new invalid image error
    pub fn invalid_image<S: Into<String>>(msg: S) -> Self {
        Self::InvalidImage(msg.into())
    }

    /// Create configuration error with the accepted range
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
    ) -> Self {
        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {})",
            parameter, value, valid_range
        ))
    }

    /// Whether the failure happened before the upload started
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Busy)
    }
}
