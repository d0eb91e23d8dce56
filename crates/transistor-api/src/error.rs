//! Transistor API error taxonomy.

use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, TransistorError>;

/// Snapshot of a failed HTTP response, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
pub struct ErrorResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Final request URL.
    pub url: Url,
    /// Raw response body.
    pub body: String,
}

/// Coarse error kind.
///
/// `RateLimit`, `Authentication`, `NotFound` and `Validation` are the
/// specific kinds; everything else is reported as `Api`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(clippy::module_name_repetitions)]
pub enum ErrorKind {
    /// HTTP 429.
    RateLimit,
    /// HTTP 401.
    Authentication,
    /// HTTP 404.
    NotFound,
    /// HTTP 422.
    Validation,
    /// Any other failure.
    Api,
}

/// Errors returned by the Transistor client.
#[derive(Debug, Error)]
#[allow(clippy::module_name_repetitions)]
pub enum TransistorError {
    /// The server rejected the request because of its rate limit.
    #[error("Rate limit exceeded. Wait 10 seconds.")]
    RateLimit(ErrorResponse),

    /// The API key is missing or invalid.
    #[error("Invalid API key")]
    Authentication(ErrorResponse),

    /// The resource does not exist or is not accessible.
    #[error("Resource not found")]
    NotFound(ErrorResponse),

    /// The request payload failed validation.
    #[error("Validation error")]
    Validation(ErrorResponse),

    /// Any other non-2xx response.
    #[error("API error: {}", .0.body)]
    Api(ErrorResponse),

    /// Timeout, refused connection, DNS failure, etc.
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// A successful response whose body is not JSON.
    #[error("failed to decode JSON response: {path}")]
    Decode {
        /// Request path.
        path: String,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// An upload file could not be read.
    #[error("failed to read file: {}", path.display())]
    File {
        /// Local file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The request path could not be joined onto the base URL.
    #[error("failed to join URL path: {path}")]
    Url {
        /// Request path.
        path: String,
        /// Underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// Invalid client configuration.
    #[error("{0}")]
    Config(String),
}

impl TransistorError {
    /// Maps a non-success response onto the taxonomy.
    ///
    /// 429, 401, 404 and 422 are checked in that order; any other status
    /// becomes a generic [`TransistorError::Api`].
    pub(crate) fn from_response(response: ErrorResponse) -> Self {
        match response.status {
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimit(response),
            StatusCode::UNAUTHORIZED => Self::Authentication(response),
            StatusCode::NOT_FOUND => Self::NotFound(response),
            StatusCode::UNPROCESSABLE_ENTITY => Self::Validation(response),
            _ => Self::Api(response),
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::RateLimit(_) => ErrorKind::RateLimit,
            Self::Authentication(_) => ErrorKind::Authentication,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Api(_)
            | Self::Network(_)
            | Self::Decode { .. }
            | Self::File { .. }
            | Self::Url { .. }
            | Self::Config(_) => ErrorKind::Api,
        }
    }

    /// Returns the offending response, if the server answered.
    #[must_use]
    pub const fn response(&self) -> Option<&ErrorResponse> {
        match self {
            Self::RateLimit(r)
            | Self::Authentication(r)
            | Self::NotFound(r)
            | Self::Validation(r)
            | Self::Api(r) => Some(r),
            _ => None,
        }
    }

    /// Returns the HTTP status code, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Network(e) => e.status(),
            _ => self.response().map(|r| r.status),
        }
    }
}
