use std::net::SocketAddr;
use std::sync::Arc;

use api_server::http;
use skill_core::config::{SkillServiceConfig, load_dotenv};
use skill_core::moderation::{OpenAiModerationGateway, OpenRouterSkillClassifier};
use skill_core::{Lexicon, SkillValidator};
use tracing::{error, info, warn};

const DEFAULT_LOG_FILTER: &str = "api_server=info,skill_core=info";

#[tokio::main]
async fn main() {
    let dotenv_result = load_dotenv();
    init_tracing();
    if let Err(err) = dotenv_result {
        warn!("ignoring .env file: {err}");
    }

    let config = match SkillServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            error!("failed to read config: {err}");
            std::process::exit(1);
        }
    };

    let lexicon = match Lexicon::load(&config.lexicon) {
        Ok(lexicon) => lexicon,
        Err(err) => {
            error!("failed to load lexicon: {err}");
            std::process::exit(1);
        }
    };

    let mut validator = SkillValidator::new(Arc::new(lexicon), config.policy.clone());

    if let Some(moderation_config) = config.moderation.clone() {
        match OpenAiModerationGateway::new(moderation_config) {
            Ok(gateway) => validator = validator.with_moderation(Arc::new(gateway)),
            Err(err) => {
                error!("failed to initialize moderation gateway: {err}");
                std::process::exit(1);
            }
        }
    } else {
        info!("MODERATION_API_KEY not set; moderation stage disabled");
    }

    if let Some(classifier_config) = config.classifier.clone() {
        match OpenRouterSkillClassifier::new(classifier_config) {
            Ok(classifier) => validator = validator.with_classifier(Arc::new(classifier)),
            Err(err) => {
                error!("failed to initialize skill classifier: {err}");
                std::process::exit(1);
            }
        }
    } else {
        info!("OPENROUTER_API_KEY not set; classifier escalation disabled");
    }

    info!(
        moderation_failure_policy = %config.policy.moderation_failure_policy,
        suggestions_enabled = config.policy.suggestions_enabled,
        max_candidate_chars = config.max_candidate_chars,
        "skill validator ready"
    );

    let app = http::build_router(http::AppState {
        validator,
        max_candidate_chars: config.max_candidate_chars,
    });

    let addr: SocketAddr = match config.bind_addr.parse() {
        Ok(addr) => addr,
        Err(err) => {
            error!("invalid API_BIND_ADDR {}: {err}", config.bind_addr);
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {addr}: {err}");
            std::process::exit(1);
        }
    };

    info!(
        "skill api listening on {}",
        listener.local_addr().unwrap_or(addr)
    );

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("server exited with error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
    let json_output = std::env::var("LOG_FORMAT")
        .map(|value| value.trim().eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_output {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
