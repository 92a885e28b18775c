use std::time::Duration;

use thiserror::Error;

use crate::config_env::{
    optional_path_env, optional_trimmed_env, parse_bool_env, parse_threshold_env, parse_u64_env,
    parse_usize_env, require_path_env,
};
use crate::lexicon::LexiconSources;
use crate::moderation::{ModerationGatewayConfig, OpenRouterClassifierConfig};
use crate::validation::{ModerationFailurePolicy, ValidationPolicy};

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_MAX_CANDIDATE_CHARS: usize = 100;
pub(crate) const DEFAULT_EXTERNAL_TIMEOUT_MS: u64 = 3_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    MissingVar(String),
    #[error("invalid integer in env var {0}")]
    ParseInt(String),
    #[error("invalid number in env var {0}")]
    ParseFloat(String),
    #[error("invalid boolean in env var {0}")]
    ParseBool(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("failed to build http client: {0}")]
    HttpClient(String),
    #[error("failed to load .env file: {0}")]
    Dotenv(String),
}

/// Loads `.env` from the working directory if present.
pub fn load_dotenv() -> Result<(), ConfigError> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(ConfigError::Dotenv(err.to_string())),
    }
}

#[derive(Debug, Clone)]
pub struct SkillServiceConfig {
    pub bind_addr: String,
    pub lexicon: LexiconSources,
    pub policy: ValidationPolicy,
    pub max_candidate_chars: usize,
    pub moderation: Option<ModerationGatewayConfig>,
    pub classifier: Option<OpenRouterClassifierConfig>,
}

impl SkillServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let external_timeout_ms =
            parse_u64_env("EXTERNAL_TIMEOUT_MS", DEFAULT_EXTERNAL_TIMEOUT_MS)?;
        if external_timeout_ms == 0 {
            return Err(ConfigError::InvalidConfiguration(
                "EXTERNAL_TIMEOUT_MS must be greater than zero".to_string(),
            ));
        }

        let moderation_failure_policy = match optional_trimmed_env("MODERATION_FAILURE_POLICY") {
            Some(raw) => raw
                .parse::<ModerationFailurePolicy>()
                .map_err(ConfigError::InvalidConfiguration)?,
            None => ModerationFailurePolicy::default(),
        };

        let moderation = ModerationGatewayConfig::from_env(external_timeout_ms)?;
        let classifier = OpenRouterClassifierConfig::from_env(external_timeout_ms)?;
        let classifier_timeout = classifier
            .as_ref()
            .map(OpenRouterClassifierConfig::escalation_budget)
            .unwrap_or_else(|| Duration::from_millis(external_timeout_ms));

        let defaults = ValidationPolicy::default();
        let policy = ValidationPolicy {
            blocklist_fuzzy_threshold: parse_threshold_env(
                "BLOCKLIST_FUZZY_THRESHOLD",
                defaults.blocklist_fuzzy_threshold,
            )?,
            suggestion_threshold: parse_threshold_env(
                "SUGGESTION_THRESHOLD",
                defaults.suggestion_threshold,
            )?,
            suggestions_enabled: parse_bool_env("SUGGESTIONS_ENABLED", defaults.suggestions_enabled)?,
            moderation_failure_policy,
            external_timeout: Duration::from_millis(external_timeout_ms),
            classifier_timeout,
        };

        Ok(Self {
            bind_addr: optional_trimmed_env("API_BIND_ADDR")
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            lexicon: LexiconSources {
                skills_path: require_path_env("SKILLS_PATH")?,
                male_names_path: require_path_env("MALE_NAMES_PATH")?,
                female_names_path: require_path_env("FEMALE_NAMES_PATH")?,
                short_allowlist_path: optional_path_env("SHORT_ALLOWLIST_PATH"),
                blocklist_path: optional_path_env("BLOCKLIST_PATH"),
            },
            policy,
            max_candidate_chars: parse_usize_env(
                "MAX_CANDIDATE_CHARS",
                DEFAULT_MAX_CANDIDATE_CHARS,
            )?,
            moderation,
            classifier,
        })
    }
}
