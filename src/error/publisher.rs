use axum::{Json, http::StatusCode, response::IntoResponse};
use publisher_schema::{ApiErrorBody, ApiErrorObject};
use std::time::Duration;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum PublisherError {
    #[error("Package {0} not found")]
    PackageNotFound(String),

    #[error("Invalid package: {0}")]
    PackageInvalid(String),

    #[error("Project {0} not found")]
    ProjectNotFound(String),

    #[error("Model {0} not found")]
    ModelNotFound(String),

    #[error("Failed to compile {path}: {message}")]
    Compile { path: String, message: String },

    #[error("Invalid connection configuration: {0}")]
    ConnectionConfig(String),

    #[error("Invalid schedule on {resource}: {message}")]
    InvalidSchedule { resource: String, message: String },

    #[error("Action {action} failed: {message}")]
    ActionFailed { action: String, message: String },

    #[error("Action timed out after {0:?}")]
    ActionTimeout(Duration),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Ractor error: {0}")]
    RactorError(String),
}

impl PublisherError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PublisherError::PackageNotFound(_)
                | PublisherError::ProjectNotFound(_)
                | PublisherError::ModelNotFound(_)
        )
    }
}

impl IntoResponse for PublisherError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match &self {
            PublisherError::PackageNotFound(_)
            | PublisherError::ProjectNotFound(_)
            | PublisherError::ModelNotFound(_) => (
                StatusCode::NOT_FOUND,
                ApiErrorObject {
                    code: "NOT_FOUND".to_string(),
                    message: self.to_string(),
                },
            ),

            PublisherError::PackageInvalid(_)
            | PublisherError::Compile { .. }
            | PublisherError::ConnectionConfig(_)
            | PublisherError::InvalidSchedule { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorObject {
                    code: "PACKAGE_INVALID".to_string(),
                    message: self.to_string(),
                },
            ),

            PublisherError::ActionFailed { .. }
            | PublisherError::ActionTimeout(_)
            | PublisherError::IoError(_)
            | PublisherError::RactorError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorObject {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred.".to_string(),
                },
            ),
        };
        (status, Json(ApiErrorBody { inner: error_body })).into_response()
    }
}
