use crate::{
    prediction::PredictionService,
    routes::ApiError,
    server::SharedState,
    upload::{SessionId, SessionView, UploadController},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

/// Looks up the controller of an open page session.
pub(crate) fn controller(
    state: &SharedState,
    session: &SessionId,
) -> Result<Arc<UploadController<PredictionService>>, ApiError> {
    state.sessions.get(session).ok_or_else(|| {
        tracing::debug!(session = %session, "Unknown session");
        ApiError::SessionNotFound
    })
}

pub async fn session_state(
    State(state): State<SharedState>,
    Path(session): Path<SessionId>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(controller(&state, &session)?.view()))
}

/// Sent by the page when it is unloaded, so a reload leaves nothing behind.
pub async fn close_session(
    State(state): State<SharedState>,
    Path(session): Path<SessionId>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.close(&session) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound)
    }
}
