use crate::accounts::{PasswordError, TokenError};
use crate::config::ConfigError;
use crate::mail::MailError;
use crate::moderation::TransitionError;
use crate::store::RepositoryError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// Process-level failures raised while booting or running the service.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Mail(MailError),
    Bootstrap(ServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Mail(err) => write!(f, "mail setup error: {}", err),
            AppError::Bootstrap(err) => write!(f, "bootstrap error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Mail(err) => Some(err),
            AppError::Bootstrap(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "unhandled application error");
        let body = Json(json!({ "success": false, "message": "Something went wrong!" }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<MailError> for AppError {
    fn from(value: MailError) -> Self {
        Self::Mail(value)
    }
}

impl From<ServiceError> for AppError {
    fn from(value: ServiceError) -> Self {
        Self::Bootstrap(value)
    }
}

impl From<TransitionError> for ServiceError {
    fn from(value: TransitionError) -> Self {
        ServiceError::InvalidState(value.to_string())
    }
}

/// Error raised by the domain services. Client-facing variants carry the message that is
/// returned verbatim in the `{ success: false, message }` body.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Suspended(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    InvalidState(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Mail(#[from] MailError),
}

impl ServiceError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) | ServiceError::Repository(RepositoryError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            ServiceError::Forbidden(_) | ServiceError::Suspended(_) => StatusCode::FORBIDDEN,
            ServiceError::Unauthorized(_) | ServiceError::Token(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Conflict(_) | ServiceError::Repository(RepositoryError::Conflict) => {
                StatusCode::CONFLICT
            }
            ServiceError::Invalid(_) | ServiceError::InvalidState(_) => StatusCode::BAD_REQUEST,
            ServiceError::Repository(RepositoryError::Unavailable(_))
            | ServiceError::Password(_)
            | ServiceError::Mail(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        match self {
            ServiceError::Repository(RepositoryError::NotFound) => "Not found".to_string(),
            ServiceError::Repository(RepositoryError::Conflict) => {
                "Record already exists".to_string()
            }
            ServiceError::Token(_) => "Invalid or expired token".to_string(),
            ServiceError::Mail(_) => "Failed to send email.".to_string(),
            ServiceError::Repository(RepositoryError::Unavailable(_))
            | ServiceError::Password(_) => "Server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let mut body = json!({
            "success": false,
            "message": self.client_message(),
        });
        if matches!(self, ServiceError::Suspended(_)) {
            body["isSuspended"] = json!(true);
        }

        (status, Json(body)).into_response()
    }
}
