//! Error types for the WoRMS API client

use std::fmt;

/// Errors that can occur when interacting with the WoRMS API
///
/// Every failure of a client call is reported through this one type. The
/// variant says which stage failed and `source()` yields the underlying cause.
#[derive(Debug)]
pub enum WormsError {
    /// HTTP request failed (connection, timeout, body read)
    Http(reqwest::Error),
    /// Service answered with a non-success status
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
    /// Failed to parse JSON response
    Json(serde_json::Error),
    /// Argument rejected before any request was made
    InvalidArgument(String),
}

impl fmt::Display for WormsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "WoRMS HTTP error: {}", e),
            Self::Status { status, url } => {
                write!(f, "WoRMS returned status {} for {}", status, url)
            }
            Self::Json(e) => write!(f, "WoRMS JSON parse error: {}", e),
            Self::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
        }
    }
}

impl std::error::Error for WormsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Status { .. } | Self::InvalidArgument(_) => None,
        }
    }
}

impl From<reqwest::Error> for WormsError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<serde_json::Error> for WormsError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Result type for WoRMS API operations
pub type Result<T> = std::result::Result<T, WormsError>;
