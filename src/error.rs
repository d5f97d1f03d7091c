//! Typed errors returned at the call boundary.
//!
//! Every failed call surfaces exactly one terminal [`Error`]. Errors caused by
//! an HTTP status carry an [`ErrorKind`] and the `message` field parsed from
//! the response body, when one could be parsed.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::http::TransportError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Classification of a terminal HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    QuotaExceeded,
    NotFound,
    Conflict,
    InternalServerError,
    BadGateway,
    ServiceUnavailable,
    /// Only terminal once the retry budget is spent while still timing out.
    RequestTimeout,
    /// Any status outside the fixed table.
    Unexpected(u16),
}

impl ErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ErrorKind::BadRequest,
            401 => ErrorKind::Unauthorized,
            402 => ErrorKind::QuotaExceeded,
            404 => ErrorKind::NotFound,
            409 => ErrorKind::Conflict,
            500 => ErrorKind::InternalServerError,
            502 => ErrorKind::BadGateway,
            503 => ErrorKind::ServiceUnavailable,
            504 => ErrorKind::RequestTimeout,
            other => ErrorKind::Unexpected(other),
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::QuotaExceeded => 402,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::InternalServerError => 500,
            ErrorKind::BadGateway => 502,
            ErrorKind::ServiceUnavailable => 503,
            ErrorKind::RequestTimeout => 504,
            ErrorKind::Unexpected(status) => *status,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::BadRequest => write!(f, "Bad request"),
            ErrorKind::Unauthorized => write!(f, "Unauthorized"),
            ErrorKind::QuotaExceeded => write!(f, "Quota exceeded"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::Conflict => write!(f, "Conflict"),
            ErrorKind::InternalServerError => write!(f, "Internal server error"),
            ErrorKind::BadGateway => write!(f, "Bad gateway"),
            ErrorKind::ServiceUnavailable => write!(f, "Service unavailable"),
            ErrorKind::RequestTimeout => write!(f, "Request timeout"),
            ErrorKind::Unexpected(status) => write!(f, "[{}]", status),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// The server answered with a terminal, non-200 status.
    #[error("{kind}: {}", message.as_deref().unwrap_or("unknown"))]
    Status {
        kind: ErrorKind,
        message: Option<String>,
    },

    /// The request never produced a response (and was not a timeout).
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

impl Error {
    pub fn status(kind: ErrorKind, message: Option<String>) -> Self {
        Error::Status { kind, message }
    }

    /// Shorthand for a locally detected authorization failure.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Error::Status {
            kind: ErrorKind::Unauthorized,
            message: Some(message.into()),
        }
    }

    /// Maps a terminal status and its raw body to a typed error.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        Error::Status {
            kind: ErrorKind::from_status(status),
            message: parse_message(body),
        }
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Status { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Error::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        self.kind().map(|kind| kind.status())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<serde_json::Value>,
}

/// Extracts the `message` string from an error body. Never fails.
pub fn parse_message(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    match parsed.message? {
        serde_json::Value::String(message) => Some(message),
        _ => None,
    }
}
