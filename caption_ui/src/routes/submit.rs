use crate::{
    routes::{session::controller, ApiError},
    server::SharedState,
    upload::SessionId,
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::instrument;

#[derive(Serialize, Deserialize, Debug)]
pub struct CaptionBody {
    pub caption: String,
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[instrument(skip(state))]
pub async fn submit(
    State(state): State<SharedState>,
    Path(session): Path<SessionId>,
) -> Result<Json<CaptionBody>, ApiError> {
    let controller = controller(&state, &session)?;

    let start = Instant::now();
    let result = controller.submit().await;

    let outcome = match &result {
        Ok(_) => "success",
        Err(err) => err.kind(),
    };
    state.metrics.record_submission(outcome);
    if matches!(outcome, "success" | "endpoint" | "transport") {
        state
            .metrics
            .record_prediction_duration(millis(start.elapsed()), outcome);
    }

    let caption = result?;
    Ok(Json(CaptionBody { caption }))
}
