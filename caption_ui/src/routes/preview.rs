use crate::{
    routes::{session::controller, ApiError},
    server::SharedState,
    upload::SessionId,
};
use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::Response,
};

pub async fn preview(
    State(state): State<SharedState>,
    Path((session, generation)): Path<(SessionId, u64)>,
) -> Result<Response, ApiError> {
    let (handle, bytes) = controller(&state, &session)?
        .preview(generation)
        .ok_or(ApiError::PreviewNotFound)?;

    Response::builder()
        .header(header::CONTENT_TYPE, handle.mime_type)
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from(bytes))
        .map_err(|e| ApiError::PreviewResponse(e.to_string()))
}
