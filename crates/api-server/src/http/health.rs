use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use skill_core::models::OkResponse;
use tracing::debug;

use super::AppState;

pub(super) async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(OkResponse { ok: true }))
}

/// The lexicon is loaded before the listener binds, so a running server is
/// always ready.
pub(super) async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let lexicon = state.validator.lexicon();
    debug!(
        skills = lexicon.skills().len(),
        names = lexicon.names().len(),
        short_allowlist = lexicon.short_allowlist().len(),
        blocklist = lexicon.blocklist().len(),
        "readiness check"
    );

    (StatusCode::OK, Json(OkResponse { ok: true }))
}
