//! Error types for genseqdid
//!
//! Every variant maps to a fixed HTTP status and a message key resolved by
//! the localization layer at the response boundary.

use hyper::StatusCode;
use std::fmt;

/// Kind of entity a lookup failed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Sequence,
    Document,
    Resource,
    Session,
    Route,
}

impl EntityKind {
    /// Localization key for the "not found" message of this kind
    pub fn message_key(&self) -> &'static str {
        match self {
            EntityKind::Sequence => "sequence_not_found",
            EntityKind::Document => "document_not_found",
            EntityKind::Resource => "resource_not_found",
            EntityKind::Session => "session_not_found",
            EntityKind::Route => "not_found",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Sequence => write!(f, "sequence"),
            EntityKind::Document => write!(f, "document"),
            EntityKind::Resource => write!(f, "resource"),
            EntityKind::Session => write!(f, "session"),
            EntityKind::Route => write!(f, "route"),
        }
    }
}

/// Main error type for service operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for the response body
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Config(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Localization key for the human-readable message
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound { kind, .. } => kind.message_key(),
            Self::MethodNotAllowed(_) => "method_not_allowed",
            Self::ServiceUnavailable(_) => "maintenance",
            Self::Config(_) | Self::Internal(_) => "internal_error",
        }
    }

    /// Detail safe to show to clients. Server-side faults stay in the logs.
    pub fn client_detail(&self) -> Option<String> {
        match self {
            Self::Config(_) | Self::Internal(_) => None,
            Self::NotFound { kind, id } => Some(format!("{} '{}' does not exist", kind, id)),
            Self::BadRequest(d)
            | Self::Unauthorized(d)
            | Self::Forbidden(d)
            | Self::MethodNotAllowed(d)
            | Self::ServiceUnavailable(d) => Some(d.clone()),
        }
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for ServiceError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for ServiceError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Unauthorized(format!("JWT error: {}", err))
    }
}

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;
