//! Existence check error types

use std::time::Duration;

/// Errors that can occur while asking the server whether a value is taken.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// HTTP error response from the endpoint.
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// Network error during the request.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Request timed out.
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// Endpoint could not be joined onto the base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Response body was not the expected JSON.
    #[error("Response parse error: {message}")]
    Parse {
        /// Description of the parse error.
        message: String,
        /// Raw response body, if available.
        body: Option<String>,
    },
}

impl CheckError {
    /// Creates a new HTTP error.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Creates a new parse error with the raw response body.
    pub fn parse_with_body(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            body: Some(body.into()),
        }
    }

    /// Returns the HTTP status code if this is an HTTP error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short user-facing text for the "check unavailable" state.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Http { .. } | Self::Network(_) | Self::Timeout(_) => {
                "Could not check availability right now."
            }
            Self::InvalidUrl(_) | Self::Parse { .. } => {
                "Availability check returned an unexpected answer."
            }
        }
    }
}
