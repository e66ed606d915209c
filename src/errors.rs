//! Hospital Admin Error Definitions
//!
//! This module defines all error types and error handling utilities for the client.
//! Errors are categorized into transport errors, response errors, download errors,
//! and client-side validation errors.

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Base error type for all client errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// Client has been closed
    #[error("Client is closed")]
    ClientClosed,

    /// The request never completed (connect failure, timeout, broken body)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A report download answered with a non-success status
    #[error("HTTP error {status}: {status_text}")]
    Http {
        /// Numeric status code
        status: u16,
        /// Canonical reason phrase, empty when unknown
        status_text: String,
    },

    /// An entity request answered with a non-success status
    #[error("Request failed with status {status}")]
    RequestFailed {
        /// Numeric status code
        status: u16,
    },

    /// The response carries no body that can be read incrementally
    #[error("Streaming not supported: {0}")]
    UnsupportedStream(String),

    /// Response body is not the JSON shape we expected
    #[error("Malformed JSON response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Base URL or composed endpoint could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Invalid argument was provided
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A form field failed validation
    #[error("Invalid value for {field}: {message}")]
    Validation {
        /// Wire name of the offending field
        field: &'static str,
        /// Human readable reason
        message: String,
    },

    /// The server acknowledged a delete with `success: false`
    #[error("Server refused to delete record {0}")]
    DeleteRejected(String),

    /// A report is already being generated by this workflow
    #[error("A report download is already in progress")]
    DownloadInProgress,

    /// The download was cancelled because its view was closed
    #[error("Download cancelled")]
    Cancelled,

    /// Every generated file number collided with an existing record
    #[error("Could not allocate a unique file number after {0} attempts")]
    FileNumberExhausted(u32),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Returns the HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } | ApiError::RequestFailed { status } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true for errors that mean the workflow was torn down
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}

/// Maps an HTTP status of an entity route to an error
///
/// Success statuses (2xx) map to `None`. Every other status is reported as
/// `RequestFailed` carrying the numeric code.
pub fn map_status_to_error(status: StatusCode) -> Option<ApiError> {
    if status.is_success() {
        None
    } else {
        Some(ApiError::RequestFailed {
            status: status.as_u16(),
        })
    }
}

/// Maps an HTTP status of a report route to an error
///
/// Report downloads keep the reason phrase so it can be shown to the user.
pub fn map_download_status_to_error(status: StatusCode) -> Option<ApiError> {
    if status.is_success() {
        None
    } else {
        Some(ApiError::Http {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        })
    }
}

