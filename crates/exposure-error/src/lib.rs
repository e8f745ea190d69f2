use axum::{http::StatusCode, response::IntoResponse};
use serde_json::json;
use thiserror::Error;

/// API-facing error type
///
/// Core components return their own typed errors; this enum is what the
/// outermost layer turns them into before answering a client. It decides the
/// HTTP status, the stable error code and the user-visible message.
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Client Input Errors =====
    #[error("Invalid publish token: {0}")]
    InvalidPublishToken(String),

    #[error("Publish token rejected")]
    PublishTokenRejected,

    // ===== Upstream Service Errors =====
    #[error("Verification service unavailable: {0}")]
    VerificationUnavailable(String),

    #[error("Configuration unavailable: {0}")]
    ConfigurationUnavailable(String),

    #[error("Federation error: {0}")]
    Federation(String),

    #[error("External service error: {0}")]
    Transport(String),

    // ===== Internal Server Errors =====
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidPublishToken(_) => StatusCode::BAD_REQUEST,
            AppError::PublishTokenRejected => StatusCode::FORBIDDEN,
            AppError::VerificationUnavailable(_) | AppError::ConfigurationUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Federation(_) | AppError::Transport(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a user-friendly error message (without sensitive details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidPublishToken(msg) => format!("Invalid publish token: {}", msg),
            AppError::PublishTokenRejected => "Publish token was not accepted".to_string(),
            AppError::VerificationUnavailable(_) => {
                "Token verification is temporarily unavailable, try again later".to_string()
            }
            AppError::ConfigurationUnavailable(_) => {
                "Exposure configuration is not available yet".to_string()
            }
            AppError::Federation(_) => "Federation error".to_string(),
            AppError::Transport(_) => "External service error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// Get error code for programmatic error handling
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidPublishToken(_) => "INVALID_PUBLISH_TOKEN",
            AppError::PublishTokenRejected => "PUBLISH_TOKEN_REJECTED",
            AppError::VerificationUnavailable(_) => "VERIFICATION_UNAVAILABLE",
            AppError::ConfigurationUnavailable(_) => "CONFIGURATION_UNAVAILABLE",
            AppError::Federation(_) => "FEDERATION_ERROR",
            AppError::Transport(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Numeric code carried in the response envelope for mobile clients
    pub fn numeric_code(&self) -> u16 {
        match self {
            AppError::InvalidPublishToken(_) => 1001,
            AppError::PublishTokenRejected => 1002,
            AppError::VerificationUnavailable(_) => 2001,
            AppError::ConfigurationUnavailable(_) => 2002,
            AppError::Federation(_) => 2003,
            AppError::Transport(_) => 2004,
            AppError::Internal(_) => 9000,
        }
    }

    /// Log this error with appropriate level and context
    pub fn log(&self) {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(
                error = %self,
                error_code = %code,
                status = %status.as_u16(),
                "Server error occurred"
            );
        } else {
            tracing::debug!(
                error = %self,
                error_code = %code,
                "Client error occurred"
            );
        }
    }

    /// Build the JSON envelope sent to clients
    pub fn envelope(&self) -> serde_json::Value {
        json!({
            "error": self.user_message(),
            "error_code": self.error_code(),
            "code": self.numeric_code(),
            "status": self.status_code().as_u16(),
        })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        self.log();
        (self.status_code(), axum::Json(self.envelope())).into_response()
    }
}
