pub mod gateway;
pub mod openai;
pub mod openrouter;
pub mod prompts;

pub use gateway::{
    ClassifierFuture, ClassifierRequest, ClassifierTag, ExternalServiceError, ModerationCategory,
    ModerationFuture, ModerationGateway, ModerationOutcome, SkillClassifier,
};
pub use openai::{ModerationGatewayConfig, OpenAiModerationGateway};
pub use openrouter::{OpenRouterClassifierConfig, OpenRouterModelRoute, OpenRouterSkillClassifier};
