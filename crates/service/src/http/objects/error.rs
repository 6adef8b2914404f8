use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};

use common::archive::ArchiveError;
use common::bucket::ResolveError;
use common::store::StoreError;

/// Everything that can end an object request early.
#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
    #[error("{0}")]
    Resolve(#[from] ResolveError),
    #[error("{0}")]
    Store(#[from] StoreError),
    #[error("{0}")]
    Archive(#[from] ArchiveError),
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("method not allowed: {0}")]
    MethodNotAllowed(Method),
}

impl ObjectError {
    pub fn status(&self) -> StatusCode {
        match self {
            ObjectError::Resolve(ResolveError::PathEscape { .. }) => StatusCode::FORBIDDEN,
            ObjectError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ObjectError::Store(StoreError::IsDirectory(_)) => StatusCode::BAD_REQUEST,
            ObjectError::Store(StoreError::Body(_)) => StatusCode::BAD_REQUEST,
            ObjectError::Store(StoreError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ObjectError::Archive(ArchiveError::NotFound(_)) => StatusCode::NOT_FOUND,
            ObjectError::Archive(ArchiveError::InvalidLocator(_)) => StatusCode::BAD_REQUEST,
            ObjectError::Archive(ArchiveError::LimitExceeded(_)) => StatusCode::PAYLOAD_TOO_LARGE,
            ObjectError::Archive(ArchiveError::Io(_) | ArchiveError::Read(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ObjectError::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ObjectError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    fn message(&self) -> String {
        match self {
            ObjectError::Store(StoreError::NotFound(_)) => "File not found".to_string(),
            ObjectError::Store(StoreError::Io(e)) => format!("Error accessing file: {}", e),
            ObjectError::Archive(ArchiveError::Read(e)) => format!("Error reading ZIP file: {}", e),
            ObjectError::Archive(ArchiveError::Io(e)) => format!("Error unzipping file: {}", e),
            ObjectError::MethodNotAllowed(_) => "Method not allowed".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ObjectError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "request rejected");
        }

        let mut response = (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.message(),
        )
            .into_response();

        if let ObjectError::MethodNotAllowed(_) = self {
            response.headers_mut().insert(
                header::ALLOW,
                HeaderValue::from_static("GET, HEAD, PUT, POST, DELETE"),
            );
        }
        response
    }
}
