use crate::views;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use log::{error, warn};
use thiserror::Error;
use tokio_postgres::error::SqlState;

/// Handler failure, rendered as an HTML error page with a matching status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// The write would leave a dangling reference.
    #[error("{0}")]
    Conflict(String),

    #[error("postgres error: {0}")]
    Postgres(#[source] tokio_postgres::Error),

    #[error("mongodb error: {0}")]
    Mongo(#[from] mongodb::error::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Postgres(_) | ApiError::Mongo(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        if err.code() == Some(&SqlState::FOREIGN_KEY_VIOLATION) {
            let detail = err
                .as_db_error()
                .and_then(|db| db.detail().map(str::to_string))
                .unwrap_or_else(|| "the record is still referenced".to_string());
            return ApiError::Conflict(detail);
        }
        ApiError::Postgres(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected ({}): {}", status, self);
        }

        // Driver errors are logged in full but not echoed to the page.
        let message = match &self {
            ApiError::Postgres(_) | ApiError::Mongo(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        (status, Html(views::error_page(status, &message))).into_response()
    }
}
