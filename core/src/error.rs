//! Error types for the verification service clients.
//!
//! # Design
//! One `ApiError` covers every failure a client call can produce, grouped by
//! who has to act on it: configuration and input errors are raised before any
//! request is sent, `Unauthorized` and `Server` come from the HTTP layer, and
//! `Daspeak` wraps the typed rejections decoded from the DAS-Peak error
//! envelope. Nothing here is retried.

use std::path::PathBuf;

use thiserror::Error;

use crate::daspeak::DaspeakError;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by service clients.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Client configuration is incomplete or invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The call input was rejected locally; no request was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An audio path does not exist.
    #[error("file {} not found", path.display())]
    FileNotFound { path: PathBuf },

    /// An audio path exists but could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The gateway rejected the request for lack of credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The service answered with an error it did not classify, or with a
    /// body that could not be interpreted.
    #[error("the server encountered an error with status code {status}: {body}")]
    Server { status: u16, body: String },

    /// A DAS-Peak business rejection.
    #[error(transparent)]
    Daspeak(#[from] DaspeakError),

    /// Connection, TLS or timeout failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),
}

impl ApiError {
    /// Returns the HTTP status for errors that carry one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the error was raised before any request was sent.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ApiError::Config(_)
                | ApiError::InvalidInput(_)
                | ApiError::FileNotFound { .. }
                | ApiError::Io(_)
                | ApiError::Serialization(_)
        )
    }
}
