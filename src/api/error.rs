use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Errors surfaced to HTTP clients. Every variant renders as
/// `{"message": ...}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Product image is required")]
    ImageRequired,

    #[error("File is too large")]
    FileTooLarge,

    #[error("Only image files are allowed")]
    InvalidFileType,

    #[error("Unexpected field")]
    UnexpectedField(String),

    #[error("Server Error")]
    Server(#[from] crate::Error),

    #[error("{0}")]
    Unexpected(String),

    #[error("Not Found")]
    NotFound,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ImageRequired
            | ApiError::FileTooLarge
            | ApiError::InvalidFileType
            | ApiError::UnexpectedField(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Server(_) | ApiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::FileTooLarge
        } else {
            ApiError::Unexpected(err.body_text())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Server(source) => error!("Request failed: {}", source),
            ApiError::Unexpected(message) => error!("Unexpected request error: {}", message),
            ApiError::UnexpectedField(field) => warn!("Rejected unexpected file field '{}'", field),
            other => warn!("Rejected request: {}", other),
        }

        let body = Json(json!({ "message": self.to_string() }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{FieldError, ValidationErrors};

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_client_errors_render_messages() {
        let (status, body) = render(ApiError::ImageRequired).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Product image is required");

        let (status, body) = render(ApiError::FileTooLarge).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "File is too large");
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let err = crate::Error::Validation(ValidationErrors(vec![FieldError {
            field: "category".to_string(),
            message: "bad".to_string(),
        }]));

        let (status, body) = render(ApiError::from(err)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "message": "Server Error" }));
    }

    #[tokio::test]
    async fn test_unexpected_errors_carry_raw_message() {
        let (status, body) = render(ApiError::Unexpected("stream ended".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "stream ended");
    }
}
