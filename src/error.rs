//! Error types for tierroute
//!
//! All errors implement `IntoResponse` for Axum handlers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read configuration file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Invalid value '{value}' for environment variable {key}: {reason}")]
    ConfigEnvInvalid {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Invalid request: {0}")]
    Validation(String),

    /// Upstream API failed or rejected the request
    ///
    /// `status` is the upstream's status when it reported one, otherwise a
    /// generic server error.
    #[error("Upstream request failed ({status}): {message}")]
    Upstream { status: StatusCode, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Build an upstream error from a reqwest transport failure
    pub fn from_transport(error: &reqwest::Error) -> Self {
        let status = error
            .status()
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::Upstream {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. }
            | Self::ConfigEnvInvalid { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            // Upstream message is echoed as-is so clients see the real cause
            Self::Upstream { status, message } => (*status, message.clone()),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;
