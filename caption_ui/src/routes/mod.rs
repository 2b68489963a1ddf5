mod health;
mod metrics;
mod page;
mod preview;
mod session;
mod submit;
mod upload;

use crate::{error::UploadError, server::SharedState};
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use health::healthcheck;
pub use metrics::metrics_handler;
pub use page::{index, SESSION_HEADER};
pub use preview::preview;
pub use session::{close_session, session_state};
pub use submit::{submit, CaptionBody};
pub use upload::{browse_files, drop_files, FILE_FIELD};

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("Failed to read upload: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Session expired, reload the page.")]
    SessionNotFound,
    #[error("Preview not found")]
    PreviewNotFound,
    #[error("Failed to build preview response: {0}")]
    PreviewResponse(String),
    #[error("Failed to encode metrics: {0}")]
    Metrics(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Upload(UploadError::SubmissionInFlight) => StatusCode::CONFLICT,
            ApiError::Upload(UploadError::Endpoint(_) | UploadError::Transport) => {
                StatusCode::BAD_GATEWAY
            }
            ApiError::Upload(_) => StatusCode::BAD_REQUEST,
            ApiError::Multipart(err) => err.status(),
            ApiError::SessionNotFound | ApiError::PreviewNotFound => StatusCode::NOT_FOUND,
            ApiError::PreviewResponse(_) | ApiError::Metrics(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

pub fn api_routes(max_upload_bytes: usize) -> Router<SharedState> {
    Router::new()
        .route("/", get(index))
        .route("/api/sessions/{session}", delete(close_session))
        .route("/api/sessions/{session}/upload/drop", post(drop_files))
        .route("/api/sessions/{session}/upload/browse", post(browse_files))
        .route(
            "/api/sessions/{session}/preview/{generation}",
            get(preview),
        )
        .route("/api/sessions/{session}/submit", post(submit))
        .route("/api/sessions/{session}/state", get(session_state))
        .route("/health", get(healthcheck))
        .route("/metrics", get(metrics_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
