// ── Core error types ──
//
// User-facing errors from servdesk-core. Consumers never see reqwest
// errors or JSON parse failures directly; the `From<servdesk_api::Error>`
// impl translates transport-layer errors into domain variants while
// keeping the backend's own message when it sent one.

use thiserror::Error;

use crate::model::EntityId;
use crate::validation::FieldErrors;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the API at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request timed out")]
    Timeout,

    // ── Filter errors ────────────────────────────────────────────────
    #[error("Unknown filter field: {field}")]
    UnknownFilterField { field: String },

    #[error("Invalid value {value:?} for filter {field} (allowed: {allowed})")]
    InvalidFilterValue {
        field: String,
        value: String,
        allowed: String,
    },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity_type} {identifier} not found")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    Invalid(FieldErrors),

    #[error("Another operation is still pending for {entity_type} {id}")]
    Busy { entity_type: String, id: EntityId },

    #[error("No {expected} dialog is open")]
    NoActiveModal { expected: &'static str },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {}", .message.as_deref().unwrap_or("request failed"))]
    Api {
        /// The backend's `message`, when it sent one.
        message: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Text to show the user: the backend's message when there is one,
    /// otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api {
                message: Some(message),
                ..
            }
            | Self::AuthenticationFailed { message } => message.clone(),
            Self::Api { message: None, .. }
            | Self::Internal(_)
            | Self::ConnectionFailed { .. }
            | Self::NotFound { .. } => fallback.to_owned(),
            other => other.to_string(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<servdesk_api::Error> for CoreError {
    fn from(err: servdesk_api::Error) -> Self {
        match err {
            servdesk_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            servdesk_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            servdesk_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            servdesk_api::Error::InvalidUrl(e) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("invalid URL: {e}"),
            },
            servdesk_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            servdesk_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
            servdesk_api::Error::Encoding(msg) => {
                CoreError::Internal(format!("Request encoding error: {msg}"))
            }
        }
    }
}
