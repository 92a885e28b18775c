use std::collections::VecDeque;
use std::sync::Arc;

use api_server::http::{AppState, build_router};
use skill_core::moderation::{
    ExternalServiceError, ModerationFuture, ModerationGateway, ModerationOutcome,
};
use skill_core::{SkillValidator, ValidationPolicy};
use tokio::sync::Mutex;

use super::LexiconFixture;

pub const TEST_MAX_CANDIDATE_CHARS: usize = 100;

pub fn build_test_router(fixture: &LexiconFixture) -> axum::Router {
    let validator = SkillValidator::new(Arc::new(fixture.load()), ValidationPolicy::default());
    router_for(validator)
}

pub fn build_test_router_with_moderation(
    fixture: &LexiconFixture,
    policy: ValidationPolicy,
    moderation: QueuedModeration,
) -> axum::Router {
    let validator = SkillValidator::new(Arc::new(fixture.load()), policy)
        .with_moderation(Arc::new(moderation));
    router_for(validator)
}

fn router_for(validator: SkillValidator) -> axum::Router {
    build_router(AppState {
        validator,
        max_candidate_chars: TEST_MAX_CANDIDATE_CHARS,
    })
}

/// Moderation stub that replays queued outcomes and records what it saw.
#[derive(Clone, Default)]
pub struct QueuedModeration {
    responses: Arc<Mutex<VecDeque<Result<ModerationOutcome, ExternalServiceError>>>>,
    seen_inputs: Arc<Mutex<Vec<String>>>,
}

impl QueuedModeration {
    pub fn with_responses(responses: Vec<Result<ModerationOutcome, ExternalServiceError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            seen_inputs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn seen_inputs(&self) -> Vec<String> {
        self.seen_inputs.lock().await.clone()
    }
}

impl ModerationGateway for QueuedModeration {
    fn moderate<'a>(&'a self, input: &'a str) -> ModerationFuture<'a> {
        Box::pin(async move {
            self.seen_inputs.lock().await.push(input.to_string());
            self.responses.lock().await.pop_front().unwrap_or_else(|| {
                Err(ExternalServiceError::ProviderFailure(
                    "missing_stub_response".to_string(),
                ))
            })
        })
    }
}
