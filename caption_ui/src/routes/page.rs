use crate::{server::SharedState, upload::state::SUBMIT_LABEL_BUSY};
use axum::{
    extract::State,
    http::{header, HeaderName},
    response::{Html, IntoResponse},
};

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Response header carrying the id of the session opened for the page.
pub const SESSION_HEADER: HeaderName = HeaderName::from_static("x-session-id");

fn render(session: &str) -> String {
    INDEX_HTML
        .replace("{{SESSION_ID}}", session)
        .replace("{{BUSY_LABEL}}", SUBMIT_LABEL_BUSY)
}

/// Every page load opens a fresh session, so a reload starts empty.
pub async fn index(State(state): State<SharedState>) -> impl IntoResponse {
    let (session, _) = state.sessions.open();
    tracing::info!(session = %session, "Page session opened");

    (
        [
            (SESSION_HEADER, session.to_string()),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        Html(render(session.as_str())),
    )
}
