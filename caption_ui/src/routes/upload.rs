use crate::{
    error::UploadError,
    prediction::PredictionService,
    routes::{session::controller, ApiError},
    server::SharedState,
    upload::{ImageFile, PreviewHandle, SessionId, SessionView, UploadController},
};
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    Json,
};
use tracing::instrument;

/// Multipart field the page sends files under, once per file.
pub const FILE_FIELD: &str = "file";

async fn read_files(mut multipart: Multipart) -> Result<Vec<ImageFile>, MultipartError> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let mime_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        files.push(ImageFile::new(name, mime_type, bytes));
    }
    Ok(files)
}

fn respond(
    state: &SharedState,
    controller: &UploadController<PredictionService>,
    source: &str,
    result: Result<PreviewHandle, UploadError>,
) -> Result<Json<SessionView>, ApiError> {
    match result {
        Ok(_) => {
            state.metrics.record_upload(source, "accepted");
            Ok(Json(controller.view()))
        }
        Err(err) => {
            state.metrics.record_upload(source, "rejected");
            Err(err.into())
        }
    }
}

#[instrument(skip(state, multipart))]
pub async fn drop_files(
    State(state): State<SharedState>,
    Path(session): Path<SessionId>,
    multipart: Multipart,
) -> Result<Json<SessionView>, ApiError> {
    let controller = controller(&state, &session)?;
    let files = read_files(multipart).await?;
    let result = controller.accept_dropped_file(files);
    respond(&state, &controller, "drop", result)
}

#[instrument(skip(state, multipart))]
pub async fn browse_files(
    State(state): State<SharedState>,
    Path(session): Path<SessionId>,
    multipart: Multipart,
) -> Result<Json<SessionView>, ApiError> {
    let controller = controller(&state, &session)?;
    let files = read_files(multipart).await?;
    let result = controller.accept_browsed_file(files);
    respond(&state, &controller, "browse", result)
}
