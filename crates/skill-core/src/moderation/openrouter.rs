use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::time::sleep;
use tracing::debug;

use super::gateway::{
    ClassifierFuture, ClassifierRequest, ClassifierTag, ExternalServiceError, SkillClassifier,
    parse_provider_error_code,
};
use super::prompts::{CLASSIFIER_SYSTEM_PROMPT, classifier_user_prompt};
use crate::config::ConfigError;
use crate::config_env::{optional_trimmed_env, parse_u32_env, parse_u64_env, parse_url_env};

const DEFAULT_CHAT_COMPLETIONS_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_MAX_RETRIES: u32 = 0;
const DEFAULT_RETRY_BASE_BACKOFF_MS: u64 = 250;

const DEFAULT_PRIMARY_MODEL: &str = "openai/gpt-4o-mini";
const DEFAULT_FALLBACK_MODEL: &str = "mistralai/mistral-7b-instruct";

#[derive(Debug, Clone)]
pub struct OpenRouterModelRoute {
    pub primary_model: String,
    pub fallback_model: Option<String>,
}

impl OpenRouterModelRoute {
    fn candidate_models(&self) -> Vec<&str> {
        let mut candidates = Vec::new();
        if !self.primary_model.is_empty() {
            candidates.push(self.primary_model.as_str());
        }

        if let Some(fallback_model) = self.fallback_model.as_deref()
            && !fallback_model.is_empty()
            && fallback_model != self.primary_model
        {
            candidates.push(fallback_model);
        }

        candidates
    }
}

#[derive(Debug, Clone)]
pub struct OpenRouterClassifierConfig {
    pub chat_completions_url: String,
    pub api_key: String,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_base_backoff_ms: u64,
    pub model_route: OpenRouterModelRoute,
}

impl OpenRouterClassifierConfig {
    /// `None` when `OPENROUTER_API_KEY` is unset; the classifier stage is
    /// then skipped.
    pub fn from_env(timeout_ms: u64) -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = optional_trimmed_env("OPENROUTER_API_KEY") else {
            return Ok(None);
        };

        Ok(Some(Self {
            chat_completions_url: parse_url_env(
                "OPENROUTER_CHAT_COMPLETIONS_URL",
                DEFAULT_CHAT_COMPLETIONS_URL,
            )?,
            api_key,
            timeout_ms,
            max_retries: parse_u32_env("OPENROUTER_MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
            retry_base_backoff_ms: parse_u64_env(
                "OPENROUTER_RETRY_BASE_BACKOFF_MS",
                DEFAULT_RETRY_BASE_BACKOFF_MS,
            )?,
            model_route: OpenRouterModelRoute {
                primary_model: optional_trimmed_env("OPENROUTER_MODEL_PRIMARY")
                    .unwrap_or_else(|| DEFAULT_PRIMARY_MODEL.to_string()),
                fallback_model: optional_trimmed_env("OPENROUTER_MODEL_FALLBACK")
                    .or_else(|| Some(DEFAULT_FALLBACK_MODEL.to_string())),
            },
        }))
    }

    /// Worst-case wall time of one `classify` call: every attempt on every
    /// candidate model timing out, plus the backoff sleeps between retries.
    pub fn escalation_budget(&self) -> Duration {
        let attempts_per_model = u64::from(self.max_retries).saturating_add(1);
        let backoff_ms = (0..self.max_retries).fold(0_u64, |total, attempt| {
            total.saturating_add(
                self.retry_base_backoff_ms
                    .saturating_mul(2_u64.saturating_pow(attempt)),
            )
        });
        let per_model_ms = self
            .timeout_ms
            .saturating_mul(attempts_per_model)
            .saturating_add(backoff_ms);
        let models = self.model_route.candidate_models().len().max(1) as u64;

        Duration::from_millis(per_model_ms.saturating_mul(models))
    }
}

/// LLM classifier over OpenRouter chat completions.
#[derive(Clone)]
pub struct OpenRouterSkillClassifier {
    client: reqwest::Client,
    config: OpenRouterClassifierConfig,
}

impl OpenRouterSkillClassifier {
    pub fn new(config: OpenRouterClassifierConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| ConfigError::HttpClient(err.to_string()))?;

        Ok(Self { client, config })
    }

    async fn classify_with_model(
        &self,
        model: &str,
        user_prompt: &str,
    ) -> Result<ClassifierTag, ModelAttemptError> {
        let mut attempt = 0_u32;

        loop {
            match self.send_once(model, user_prompt).await {
                Ok(tag) => return Ok(tag),
                Err(err) => {
                    if err.retryable && attempt < self.config.max_retries {
                        let backoff_multiplier = 2_u64.saturating_pow(attempt);
                        let backoff_ms = self
                            .config
                            .retry_base_backoff_ms
                            .saturating_mul(backoff_multiplier);
                        sleep(Duration::from_millis(backoff_ms)).await;
                        attempt = attempt.saturating_add(1);
                        continue;
                    }

                    return Err(ModelAttemptError {
                        error: err.error,
                        fallback_allowed: err.fallback_allowed,
                    });
                }
            }
        }
    }

    async fn send_once(
        &self,
        model: &str,
        user_prompt: &str,
    ) -> Result<ClassifierTag, SendAttemptError> {
        let request_body = json!({
            "model": model,
            "messages": [
                { "role": "system", "content": CLASSIFIER_SYSTEM_PROMPT },
                { "role": "user", "content": user_prompt }
            ],
            "temperature": 0,
            "max_tokens": 32
        });

        let response = self
            .client
            .post(&self.config.chat_completions_url)
            .bearer_auth(&self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    SendAttemptError::retryable(ExternalServiceError::Timeout, true)
                } else {
                    SendAttemptError::retryable(
                        ExternalServiceError::ProviderFailure("request_unavailable".to_string()),
                        true,
                    )
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|_| {
            SendAttemptError::non_retryable(
                ExternalServiceError::InvalidPayload("response_body_read_failed".to_string()),
                true,
            )
        })?;

        if !status.is_success() {
            let provider_code = parse_provider_error_code(&body);
            let fallback_allowed =
                status != StatusCode::UNAUTHORIZED && status != StatusCode::FORBIDDEN;
            return Err(SendAttemptError {
                error: ExternalServiceError::ProviderFailure(format!(
                    "status={} code={provider_code}",
                    status.as_u16()
                )),
                retryable: is_retryable_status(status),
                fallback_allowed,
            });
        }

        let parsed: OpenRouterSuccessResponse = serde_json::from_str(&body).map_err(|_| {
            SendAttemptError::non_retryable(
                ExternalServiceError::InvalidPayload("response_json_parse_failed".to_string()),
                true,
            )
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| {
                SendAttemptError::non_retryable(
                    ExternalServiceError::InvalidPayload("missing_choice".to_string()),
                    true,
                )
            })?
            .message
            .content;

        let Value::String(reply) = content else {
            return Err(SendAttemptError::non_retryable(
                ExternalServiceError::InvalidPayload("unsupported_content_shape".to_string()),
                true,
            ));
        };

        ClassifierTag::parse(&reply).map_err(|err| SendAttemptError::non_retryable(err, true))
    }
}

impl SkillClassifier for OpenRouterSkillClassifier {
    fn classify<'a>(&'a self, request: ClassifierRequest<'a>) -> ClassifierFuture<'a> {
        Box::pin(async move {
            let user_prompt = classifier_user_prompt(request.candidate, &request.known_skills);
            let candidate_models = self.config.model_route.candidate_models();

            for (index, model) in candidate_models.iter().enumerate() {
                match self.classify_with_model(model, &user_prompt).await {
                    Ok(tag) => return Ok(tag),
                    Err(model_err) => {
                        let has_more_candidates = index + 1 < candidate_models.len();
                        if has_more_candidates && model_err.fallback_allowed {
                            debug!(model, error = %model_err.error, "classifier model failed; trying fallback");
                            continue;
                        }
                        return Err(model_err.error);
                    }
                }
            }

            Err(ExternalServiceError::ProviderFailure(
                "no_openrouter_model_candidates".to_string(),
            ))
        })
    }
}

#[derive(Debug)]
struct SendAttemptError {
    error: ExternalServiceError,
    retryable: bool,
    fallback_allowed: bool,
}

impl SendAttemptError {
    fn retryable(error: ExternalServiceError, fallback_allowed: bool) -> Self {
        Self {
            error,
            retryable: true,
            fallback_allowed,
        }
    }

    fn non_retryable(error: ExternalServiceError, fallback_allowed: bool) -> Self {
        Self {
            error,
            retryable: false,
            fallback_allowed,
        }
    }
}

#[derive(Debug)]
struct ModelAttemptError {
    error: ExternalServiceError,
    fallback_allowed: bool,
}

#[derive(Debug, Deserialize)]
struct OpenRouterSuccessResponse {
    choices: Vec<OpenRouterChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenRouterChoice {
    message: OpenRouterMessage,
}

#[derive(Debug, Deserialize)]
struct OpenRouterMessage {
    content: Value,
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}
