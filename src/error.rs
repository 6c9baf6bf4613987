use std::{fmt, time::Duration};

use crate::transport::Headers;

/// HTTP status the API uses to signal rate limiting.
pub const RATE_LIMIT_STATUS: u16 = 429;

/// Category of a failure that happened before any HTTP response was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Connect,
    Timeout,
    Redirect,
    Request,
    Body,
    Other,
}

impl TransportErrorKind {
    /// Stable numeric code for the failure category.
    pub fn code(&self) -> u16 {
        match self {
            TransportErrorKind::Connect => 1,
            TransportErrorKind::Timeout => 2,
            TransportErrorKind::Redirect => 3,
            TransportErrorKind::Request => 4,
            TransportErrorKind::Body => 5,
            TransportErrorKind::Other => 99,
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Redirect => "redirect",
            TransportErrorKind::Request => "request",
            TransportErrorKind::Body => "body",
            TransportErrorKind::Other => "other",
        };
        write!(f, "{name}")
    }
}

/// Every failure the library can report.
///
/// The first five variants mirror what the transport saw on the wire. HTTP
/// level variants keep the response headers so callers can still read things
/// like `retry-after` after the error was raised.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Transport error ({kind}, code {}): {message}", .kind.code())]
    Transport {
        kind: TransportErrorKind,
        message: String,
    },

    #[error("{message}")]
    AuthFlow {
        message: String,
        status: u16,
        headers: Headers,
    },

    #[error("{message}")]
    Api {
        message: String,
        status: u16,
        reason: Option<String>,
        headers: Headers,
    },

    #[error("{message}")]
    Generic {
        message: String,
        status: u16,
        headers: Headers,
    },

    #[error("unknown error")]
    Unknown { status: u16, headers: Headers },

    #[error("Could not refresh access token")]
    RefreshFailed,

    #[error("Giving up after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<ApiError>,
    },

    #[error("Server asked to retry after {}s, which exceeds the configured maximum", .retry_after.as_secs())]
    RateLimitTooLong {
        retry_after: Duration,
        #[source]
        source: Box<ApiError>,
    },

    #[error("Random source unavailable: {0}")]
    RandomSource(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status carried by the error, if it came from a response.
    ///
    /// For structured API errors this is the status reported inside the body,
    /// which may differ from the status line.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::AuthFlow { status, .. }
            | ApiError::Api { status, .. }
            | ApiError::Generic { status, .. }
            | ApiError::Unknown { status, .. } => Some(*status),
            ApiError::RetriesExhausted { source, .. } | ApiError::RateLimitTooLong { source, .. } => {
                source.status()
            }
            _ => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            ApiError::Api { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }

    pub fn headers(&self) -> Option<&Headers> {
        match self {
            ApiError::AuthFlow { headers, .. }
            | ApiError::Api { headers, .. }
            | ApiError::Generic { headers, .. }
            | ApiError::Unknown { headers, .. } => Some(headers),
            _ => None,
        }
    }

    /// Delay requested through the `retry-after` header, in whole seconds.
    pub fn retry_after(&self) -> Option<Duration> {
        self.headers()?
            .get("retry-after")?
            .trim()
            .parse::<u64>()
            .ok()
            .map(Duration::from_secs)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(RATE_LIMIT_STATUS)
    }

    /// True when the server rejected the bearer token because it expired.
    pub fn is_token_expired(&self) -> bool {
        match self {
            ApiError::Api { message, .. } | ApiError::AuthFlow { message, .. } => {
                let message = message.to_lowercase();
                message.contains("expired") && message.contains("token")
            }
            _ => false,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport { .. })
    }
}
