use axum::{
    http::{header::WWW_AUTHENTICATE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::AuthError;
use crate::error::DrillError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Could not validate credentials")]
    Unauthorized,

    #[error(transparent)]
    Drill(#[from] DrillError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Drill(DrillError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Drill(DrillError::InvalidInput(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Drill(DrillError::Config(_) | DrillError::Store(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Auth(AuthError::NotConfigured) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(AuthError::Rejected(_)) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::Transport(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{self}");
        }

        let body = Json(json!({ "detail": self.to_string() }));
        match self {
            ApiError::Unauthorized => {
                (status, [(WWW_AUTHENTICATE, "Bearer")], body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}
