use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use followgraph_core::{ErrorKind, GraphError};
use thiserror::Error;
use tracing::{debug, error};

use crate::types::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Body could not be read as the expected JSON
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Graph(e) => e.kind(),
            ApiError::InvalidBody(_) => ErrorKind::BadRequest,
            ApiError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = self.status();

        // Store and internal details stay in the log.
        let message = if kind == ErrorKind::Internal {
            error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            debug!(status = status.as_u16(), error = %self, "Request rejected");
            match &self {
                ApiError::Graph(e) => e.to_string(),
                other => other.to_string(),
            }
        };

        let body = Json(ErrorResponse {
            error: kind.as_str().to_string(),
            message,
        });
        let mut response = (status, body).into_response();
        if kind == ErrorKind::Unauthorized {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("OAuth realm=\"followgraph\""),
            );
        }
        response
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
