use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

pub type ModerationFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ModerationOutcome, ExternalServiceError>> + Send + 'a>>;

pub type ClassifierFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ClassifierTag, ExternalServiceError>> + Send + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExternalServiceError {
    #[error("external service request timed out")]
    Timeout,
    #[error("external service request failed: {0}")]
    ProviderFailure(String),
    #[error("external service returned an invalid payload: {0}")]
    InvalidPayload(String),
}

/// Moderation categories understood by the pipeline. Provider keys outside
/// this set are dropped during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModerationCategory {
    Sexual,
    SexualMinors,
    Harassment,
    HarassmentThreatening,
    Hate,
    HateThreatening,
    Illicit,
    IllicitViolent,
    SelfHarm,
    SelfHarmIntent,
    SelfHarmInstructions,
    Violence,
    ViolenceGraphic,
}

impl ModerationCategory {
    pub const ALL: [ModerationCategory; 13] = [
        Self::Sexual,
        Self::SexualMinors,
        Self::Harassment,
        Self::HarassmentThreatening,
        Self::Hate,
        Self::HateThreatening,
        Self::Illicit,
        Self::IllicitViolent,
        Self::SelfHarm,
        Self::SelfHarmIntent,
        Self::SelfHarmInstructions,
        Self::Violence,
        Self::ViolenceGraphic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sexual => "sexual",
            Self::SexualMinors => "sexual/minors",
            Self::Harassment => "harassment",
            Self::HarassmentThreatening => "harassment/threatening",
            Self::Hate => "hate",
            Self::HateThreatening => "hate/threatening",
            Self::Illicit => "illicit",
            Self::IllicitViolent => "illicit/violent",
            Self::SelfHarm => "self-harm",
            Self::SelfHarmIntent => "self-harm/intent",
            Self::SelfHarmInstructions => "self-harm/instructions",
            Self::Violence => "violence",
            Self::ViolenceGraphic => "violence/graphic",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModerationOutcome {
    pub flagged: bool,
    pub categories: Vec<ModerationCategory>,
}

impl ModerationOutcome {
    pub fn not_flagged() -> Self {
        Self::default()
    }
}

/// Safety screen run before any local stage.
pub trait ModerationGateway: Send + Sync {
    fn moderate<'a>(&'a self, input: &'a str) -> ModerationFuture<'a>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifierTag {
    Valid,
    Suggestion(String),
    Inappropriate,
    Invalid,
}

impl ClassifierTag {
    /// Parses `VALID`, `SUGGESTION: <skill>`, `INAPPROPRIATE` or `INVALID`
    /// from the first non-empty line of a model reply.
    pub fn parse(reply: &str) -> Result<Self, ExternalServiceError> {
        let line = reply
            .lines()
            .map(|line| line.trim().trim_start_matches(['-', '*', ' ']))
            .find(|line| !line.is_empty())
            .unwrap_or_default();
        let upper = line.to_ascii_uppercase();

        if upper.starts_with("SUGGESTION") {
            let suggestion = line
                .split_once(':')
                .map(|(_, rest)| rest.trim())
                .unwrap_or_default();
            if suggestion.is_empty() {
                return Err(ExternalServiceError::InvalidPayload(
                    "empty_classifier_suggestion".to_string(),
                ));
            }
            return Ok(Self::Suggestion(suggestion.to_string()));
        }
        if upper.starts_with("INAPPROPRIATE") {
            return Ok(Self::Inappropriate);
        }
        if upper.starts_with("INVALID") {
            return Ok(Self::Invalid);
        }
        if upper.starts_with("VALID") {
            return Ok(Self::Valid);
        }

        Err(ExternalServiceError::InvalidPayload(
            "unrecognized_classifier_tag".to_string(),
        ))
    }
}

#[derive(Debug, Clone)]
pub struct ClassifierRequest<'a> {
    pub candidate: &'a str,
    pub known_skills: Vec<&'a str>,
}

/// Escalation for candidates the local stages could not place.
pub trait SkillClassifier: Send + Sync {
    fn classify<'a>(&'a self, request: ClassifierRequest<'a>) -> ClassifierFuture<'a>;
}

pub(crate) fn parse_provider_error_code(body: &str) -> String {
    #[derive(Deserialize)]
    struct ProviderErrorEnvelope {
        error: Option<ProviderErrorDetails>,
    }

    #[derive(Deserialize)]
    struct ProviderErrorDetails {
        code: Option<Value>,
        #[serde(rename = "type")]
        kind: Option<String>,
    }

    let Some(details) = serde_json::from_str::<ProviderErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
    else {
        return "unknown".to_string();
    };

    match details.code {
        Some(Value::String(code)) => code,
        Some(Value::Number(code)) => code.to_string(),
        _ => details.kind.unwrap_or_else(|| "unknown".to_string()),
    }
}
