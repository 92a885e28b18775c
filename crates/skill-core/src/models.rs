use serde::{Deserialize, Serialize};

pub use crate::verdict::ValidationOutcome;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateSkillRequest {
    pub skill: String,
}

pub type ValidateSkillResponse = ValidationOutcome;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}
