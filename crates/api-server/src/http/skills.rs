use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use skill_core::models::{ValidateSkillRequest, ValidateSkillResponse};
use tracing::info;

use super::AppState;
use super::errors::bad_request_response;
use super::observability::RequestContext;

pub(super) async fn validate_skill(
    State(state): State<AppState>,
    Extension(context): Extension<RequestContext>,
    Json(req): Json<ValidateSkillRequest>,
) -> Response {
    let candidate_len = req.skill.chars().count();
    if candidate_len > state.max_candidate_chars {
        return bad_request_response(
            "candidate_too_long",
            &format!(
                "Skill must be at most {} characters",
                state.max_candidate_chars
            ),
        );
    }

    let verdict = state.validator.validate(&req.skill).await;
    info!(
        request_id = %context.request_id,
        candidate_len,
        verdict = verdict.kind(),
        "skill validation completed"
    );

    (StatusCode::OK, Json(ValidateSkillResponse::from(verdict))).into_response()
}
