use axum::routing::{get, post};
use axum::{Router, middleware};
use skill_core::SkillValidator;

mod errors;
mod health;
mod observability;
mod skills;

#[derive(Clone)]
pub struct AppState {
    pub validator: SkillValidator,
    pub max_candidate_chars: usize,
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/v1/skills/validate", post(skills::validate_skill))
        .layer(middleware::from_fn(
            observability::request_observability_middleware,
        ))
        .with_state(app_state)
}
