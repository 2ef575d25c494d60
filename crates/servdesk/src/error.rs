//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use servdesk_config::ConfigError;
use servdesk_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the API at {url}")]
    #[diagnostic(
        code(servdesk::connection_failed),
        help(
            "{reason}\n\
             Check --base-url or api.base_url in your config (servdesk config path)."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(servdesk::timeout),
        help("Increase the timeout with --timeout or api.timeout_secs.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(servdesk::auth_failed),
        help("Pass --token, set SERVDESK_TOKEN, or configure api.token_env.")
    )]
    AuthFailed { message: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(servdesk::not_found),
        help("Run: servdesk {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{resource_type} '{identifier}' has a change in progress")]
    #[diagnostic(code(servdesk::busy), help("Wait for it to finish and try again."))]
    Busy {
        resource_type: String,
        identifier: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    #[diagnostic(code(servdesk::api_error))]
    ApiError {
        status: Option<u16>,
        message: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(servdesk::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(servdesk::config),
        help("Inspect the resolved settings with: servdesk config show")
    )]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(servdesk::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Internal / IO ────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    #[diagnostic(code(servdesk::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(Box::new(other)),
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Busy { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::ApiError {
                status: Some(401 | 403),
                ..
            } => exit_code::AUTH,
            Self::ApiError {
                status: Some(404), ..
            } => exit_code::NOT_FOUND,
            Self::ApiError { .. } | Self::Config(_) | Self::Internal(_) | Self::Io(_) => {
                exit_code::GENERAL
            }
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },

            CoreError::Timeout => CliError::Timeout,

            CoreError::UnknownFilterField { field } => CliError::Validation {
                reason: format!("'{field}' is not a filter on this list"),
                field,
            },

            CoreError::InvalidFilterValue {
                field,
                value,
                allowed,
            } => CliError::Validation {
                field,
                reason: format!("'{value}' is not one of: {allowed}"),
            },

            CoreError::NotFound {
                entity_type,
                identifier,
            } => CliError::NotFound {
                list_command: list_command_for(&entity_type).into(),
                resource_type: entity_type,
                identifier,
            },

            CoreError::Invalid(errors) => CliError::Validation {
                field: "input".into(),
                reason: errors.to_string(),
            },

            CoreError::Busy { entity_type, id } => CliError::Busy {
                resource_type: entity_type,
                identifier: id.to_string(),
            },

            CoreError::Api { message, status } => CliError::ApiError {
                status,
                message: message.unwrap_or_else(|| "request failed".into()),
            },

            other @ (CoreError::NoActiveModal { .. } | CoreError::Internal(_)) => {
                CliError::Internal(other.to_string())
            }
        }
    }
}

fn list_command_for(entity_type: &str) -> &'static str {
    match entity_type {
        "service area" => "areas list",
        "transaction" => "transactions list",
        _ => "services list",
    }
}

#[cfg(test)]
mod tests {
    use servdesk_core::EntityId;

    use super::*;

    #[test]
    fn core_errors_keep_their_exit_codes() {
        let busy = CliError::from(CoreError::Busy {
            entity_type: "service".into(),
            id: EntityId::Number(7),
        });
        assert_eq!(busy.exit_code(), exit_code::CONFLICT);

        let missing = CliError::from(CoreError::NotFound {
            entity_type: "service area".into(),
            identifier: "9".into(),
        });
        assert_eq!(missing.exit_code(), exit_code::NOT_FOUND);
        assert!(matches!(
            missing,
            CliError::NotFound { ref list_command, .. } if list_command == "areas list"
        ));

        let bad_filter = CliError::from(CoreError::InvalidFilterValue {
            field: "status".into(),
            value: "bogus".into(),
            allowed: "active, inactive".into(),
        });
        assert_eq!(bad_filter.exit_code(), exit_code::USAGE);
    }

    #[test]
    fn api_message_is_shown() {
        let err = CliError::from(CoreError::Api {
            message: Some("Service is linked to bookings".into()),
            status: Some(409),
        });
        assert_eq!(err.to_string(), "API error (409): Service is linked to bookings");
        assert_eq!(err.exit_code(), exit_code::GENERAL);
    }
}
