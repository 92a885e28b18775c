use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use super::gateway::{
    ExternalServiceError, ModerationCategory, ModerationFuture, ModerationGateway,
    ModerationOutcome, parse_provider_error_code,
};
use crate::config::ConfigError;
use crate::config_env::{optional_trimmed_env, parse_url_env};

const DEFAULT_MODERATION_URL: &str = "https://api.openai.com/v1/moderations";

#[derive(Debug, Clone)]
pub struct ModerationGatewayConfig {
    pub url: String,
    pub api_key: String,
    pub model: Option<String>,
    pub timeout_ms: u64,
}

impl ModerationGatewayConfig {
    /// `None` when `MODERATION_API_KEY` is unset; moderation is then skipped.
    pub fn from_env(timeout_ms: u64) -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = optional_trimmed_env("MODERATION_API_KEY") else {
            return Ok(None);
        };

        Ok(Some(Self {
            url: parse_url_env("MODERATION_URL", DEFAULT_MODERATION_URL)?,
            api_key,
            model: optional_trimmed_env("MODERATION_MODEL"),
            timeout_ms,
        }))
    }
}

/// Client for an OpenAI-compatible `/moderations` endpoint.
#[derive(Clone)]
pub struct OpenAiModerationGateway {
    client: reqwest::Client,
    config: ModerationGatewayConfig,
}

impl OpenAiModerationGateway {
    pub fn new(config: ModerationGatewayConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| ConfigError::HttpClient(err.to_string()))?;

        Ok(Self { client, config })
    }

    async fn send(&self, input: &str) -> Result<ModerationOutcome, ExternalServiceError> {
        let mut request_body = json!({ "input": input });
        if let Some(model) = self.config.model.as_deref() {
            request_body["model"] = json!(model);
        }

        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(&self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ExternalServiceError::Timeout
                } else {
                    ExternalServiceError::ProviderFailure("request_unavailable".to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|_| {
            ExternalServiceError::InvalidPayload("response_body_read_failed".to_string())
        })?;

        if !status.is_success() {
            return Err(ExternalServiceError::ProviderFailure(format!(
                "status={} code={}",
                status.as_u16(),
                parse_provider_error_code(&body)
            )));
        }

        let parsed: ModerationResponse = serde_json::from_str(&body).map_err(|_| {
            ExternalServiceError::InvalidPayload("response_json_parse_failed".to_string())
        })?;
        let result = parsed.results.into_iter().next().ok_or_else(|| {
            ExternalServiceError::InvalidPayload("missing_moderation_result".to_string())
        })?;

        Ok(ModerationOutcome {
            flagged: result.flagged,
            categories: result.categories.flagged(),
        })
    }
}

impl ModerationGateway for OpenAiModerationGateway {
    fn moderate<'a>(&'a self, input: &'a str) -> ModerationFuture<'a> {
        Box::pin(self.send(input))
    }
}

#[derive(Debug, Deserialize)]
struct ModerationResponse {
    results: Vec<ModerationResult>,
}

#[derive(Debug, Deserialize)]
struct ModerationResult {
    flagged: bool,
    #[serde(default)]
    categories: CategoryFlags,
}

/// Known category keys; anything else in the provider payload is ignored.
#[derive(Debug, Default, Deserialize)]
struct CategoryFlags {
    #[serde(default)]
    sexual: Option<bool>,
    #[serde(default, rename = "sexual/minors")]
    sexual_minors: Option<bool>,
    #[serde(default)]
    harassment: Option<bool>,
    #[serde(default, rename = "harassment/threatening")]
    harassment_threatening: Option<bool>,
    #[serde(default)]
    hate: Option<bool>,
    #[serde(default, rename = "hate/threatening")]
    hate_threatening: Option<bool>,
    #[serde(default)]
    illicit: Option<bool>,
    #[serde(default, rename = "illicit/violent")]
    illicit_violent: Option<bool>,
    #[serde(default, rename = "self-harm")]
    self_harm: Option<bool>,
    #[serde(default, rename = "self-harm/intent")]
    self_harm_intent: Option<bool>,
    #[serde(default, rename = "self-harm/instructions")]
    self_harm_instructions: Option<bool>,
    #[serde(default)]
    violence: Option<bool>,
    #[serde(default, rename = "violence/graphic")]
    violence_graphic: Option<bool>,
}

impl CategoryFlags {
    fn flagged(&self) -> Vec<ModerationCategory> {
        [
            (self.sexual, ModerationCategory::Sexual),
            (self.sexual_minors, ModerationCategory::SexualMinors),
            (self.harassment, ModerationCategory::Harassment),
            (
                self.harassment_threatening,
                ModerationCategory::HarassmentThreatening,
            ),
            (self.hate, ModerationCategory::Hate),
            (self.hate_threatening, ModerationCategory::HateThreatening),
            (self.illicit, ModerationCategory::Illicit),
            (self.illicit_violent, ModerationCategory::IllicitViolent),
            (self.self_harm, ModerationCategory::SelfHarm),
            (self.self_harm_intent, ModerationCategory::SelfHarmIntent),
            (
                self.self_harm_instructions,
                ModerationCategory::SelfHarmInstructions,
            ),
            (self.violence, ModerationCategory::Violence),
            (self.violence_graphic, ModerationCategory::ViolenceGraphic),
        ]
        .into_iter()
        .filter_map(|(flag, category)| (flag == Some(true)).then_some(category))
        .collect()
    }
}
