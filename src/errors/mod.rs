//! Error handling module for the forum client.
//!
//! Every collaborator failure is converted into a [`ClientError`] at the call
//! site and, from there, into an [`ErrorState`] the UI can render. Nothing here
//! is allowed to take the client down.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const NO_SESSION: &str = "NO_SESSION";
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const SSO_HTTP_ERROR: &str = "SSO_HTTP_ERROR";
    pub const INVALID_RESPONSE: &str = "INVALID_RESPONSE";
    pub const SSO_API_ERROR: &str = "SSO_API_ERROR";
    pub const AUTH_ERROR: &str = "AUTH_ERROR";
    pub const STORE_ERROR: &str = "STORE_ERROR";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const CACHE_ERROR: &str = "CACHE_ERROR";
    pub const VOTE_IN_FLIGHT: &str = "VOTE_IN_FLIGHT";
}

/// Structured codes an SSO server may send instead of a free-text message.
pub mod sso_codes {
    pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";
    pub const SESSION_EXPIRED: &str = "SESSION_EXPIRED";
}

/// Classification of a server-reported SSO failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    InvalidCredentials,
    SessionExpired,
    Generic,
}

impl ApiErrorKind {
    /// Classify a server failure.
    ///
    /// A structured `code` wins. Servers that only send prose are classified by
    /// sniffing the message.
    pub fn classify(code: Option<&str>, message: &str) -> Self {
        match code {
            Some(sso_codes::INVALID_CREDENTIALS) => return ApiErrorKind::InvalidCredentials,
            Some(sso_codes::SESSION_EXPIRED) => return ApiErrorKind::SessionExpired,
            _ => {}
        }

        let lower = message.to_lowercase();
        if lower.contains("invalid") || lower.contains("credential") {
            ApiErrorKind::InvalidCredentials
        } else if lower.contains("expire") || lower.contains("session") {
            ApiErrorKind::SessionExpired
        } else {
            ApiErrorKind::Generic
        }
    }

    pub fn friendly_message(&self) -> &'static str {
        match self {
            ApiErrorKind::InvalidCredentials => "Invalid SSO credentials. Please sign in again.",
            ApiErrorKind::SessionExpired => "Your SSO session has expired. Please sign in again.",
            ApiErrorKind::Generic => "SSO authentication failed. Please sign in again.",
        }
    }
}

/// Client error type.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientError {
    /// No session token is cached. A normal state, surfaced as an error only
    /// by the SSO status check.
    NoSession,
    /// Transport-level failure reaching the SSO endpoint
    Network(String),
    /// Non-2xx status from the SSO endpoint
    Http(u16),
    /// Empty response body, or one missing the fields we need
    InvalidResponse(String),
    /// Response body that is not the JSON we expect
    MalformedResponse(String),
    /// SSO server reported a failure
    Api { kind: ApiErrorKind, detail: String },
    /// Hosted auth service rejected the request
    Auth(String),
    /// Remote data store read/write failure (distinct from "row not found")
    Store(String),
    /// Resource not found
    NotFound(String),
    /// Validation error
    Validation(String),
    /// Local cache failure
    Cache(String),
}

impl ClientError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ClientError::NoSession => StatusCode::UNAUTHORIZED,
            ClientError::Network(_) => StatusCode::BAD_GATEWAY,
            ClientError::Http(_) => StatusCode::BAD_GATEWAY,
            ClientError::InvalidResponse(_) | ClientError::MalformedResponse(_) => {
                StatusCode::BAD_GATEWAY
            }
            ClientError::Api { .. } => StatusCode::UNAUTHORIZED,
            ClientError::Auth(_) => StatusCode::UNAUTHORIZED,
            ClientError::Store(_) => StatusCode::BAD_GATEWAY,
            ClientError::NotFound(_) => StatusCode::NOT_FOUND,
            ClientError::Validation(_) => StatusCode::BAD_REQUEST,
            ClientError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::NoSession => codes::NO_SESSION,
            ClientError::Network(_) => codes::NETWORK_ERROR,
            ClientError::Http(_) => codes::SSO_HTTP_ERROR,
            ClientError::InvalidResponse(_) | ClientError::MalformedResponse(_) => {
                codes::INVALID_RESPONSE
            }
            ClientError::Api { .. } => codes::SSO_API_ERROR,
            ClientError::Auth(_) => codes::AUTH_ERROR,
            ClientError::Store(_) => codes::STORE_ERROR,
            ClientError::NotFound(_) => codes::NOT_FOUND,
            ClientError::Validation(_) => codes::VALIDATION_ERROR,
            ClientError::Cache(_) => codes::CACHE_ERROR,
        }
    }

    /// Get the user-facing message.
    pub fn message(&self) -> String {
        match self {
            ClientError::NoSession => "No SSO session found. Please sign in.".to_string(),
            ClientError::Network(_) => {
                "Network error. Please check your connection and try again.".to_string()
            }
            ClientError::Http(status) => format!("SSO server responded with status {}", status),
            ClientError::InvalidResponse(_) => "Empty response from SSO server.".to_string(),
            ClientError::MalformedResponse(_) => {
                "Unreadable response from SSO server.".to_string()
            }
            ClientError::Api { kind, .. } => kind.friendly_message().to_string(),
            ClientError::Auth(msg) => msg.clone(),
            ClientError::Store(msg) => msg.clone(),
            ClientError::NotFound(msg) => msg.clone(),
            ClientError::Validation(msg) => msg.clone(),
            ClientError::Cache(msg) => msg.clone(),
        }
    }

    /// Raw detail kept next to the friendly message, when there is one.
    pub fn detail(&self) -> Option<String> {
        match self {
            ClientError::Network(detail)
            | ClientError::InvalidResponse(detail)
            | ClientError::MalformedResponse(detail)
            | ClientError::Api { detail, .. } => Some(detail.clone()),
            _ => None,
        }
    }

    /// Convert into the local-state form rendered by the UI.
    pub fn to_state(&self) -> ErrorState {
        ErrorState {
            code: self.error_code().to_string(),
            message: self.message(),
            detail: self.detail(),
        }
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.detail() {
            Some(detail) => write!(f, "{}: {} ({})", self.error_code(), self.message(), detail),
            None => write!(f, "{}: {}", self.error_code(), self.message()),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!("HTTP error: {:?}", err);
        if err.is_decode() {
            ClientError::MalformedResponse(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<sqlx::Error> for ClientError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Cache database error: {:?}", err);
        ClientError::Cache(format!("Cache error: {}", err))
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        ClientError::MalformedResponse(format!("JSON error: {}", err))
    }
}

/// Error as held in local state: `code` plus a user-facing `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorState {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorState {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            detail: None,
        }
    }
}

impl From<ClientError> for ErrorState {
    fn from(err: ClientError) -> Self {
        err.to_state()
    }
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorState,
}

impl ErrorResponse {
    pub fn new(error: &ClientError) -> Self {
        Self {
            success: false,
            error: error.to_state(),
        }
    }
}

impl IntoResponse for ClientError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ErrorResponse::new(&self))).into_response()
    }
}
