//! repair-concierge server binary.
//!
//! Wires configuration, the session store (Redis with in-memory
//! fallback), the Ollama adapters and the HTTP surface, then serves.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use repair_concierge::adapters::ai::{OllamaConfig, OllamaGenerator, OllamaTopicClassifier};
use repair_concierge::adapters::http::{chat_routes, health_routes, ChatHandlers};
use repair_concierge::adapters::storage::{InMemorySessionStore, RedisSessionStore};
use repair_concierge::application::handlers::chat::{
    GetSessionHandler, ProcessMessageHandler, ResetSessionHandler,
};
use repair_concierge::config::AppConfig;
use repair_concierge::domain::guardrail::{EntityLexicon, Guardrail, ValidationStrategy};
use repair_concierge::ports::SessionStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    let store = build_session_store(&config).await;

    let ollama = OllamaConfig::new(config.ai.base_url.clone(), config.ai.model.clone())
        .with_timeout(config.ai.timeout());
    let generator = Arc::new(OllamaGenerator::new(ollama.clone()));

    let guardrail = Arc::new(Guardrail::new(
        config.guardrail.policy(),
        Arc::new(EntityLexicon::default()),
    ));

    let mut process_handler = ProcessMessageHandler::new(
        store.clone(),
        generator,
        guardrail,
        config.guardrail.max_attempts,
    );
    if config.guardrail.strategy == ValidationStrategy::LlmAssisted {
        process_handler =
            process_handler.with_classifier(Arc::new(OllamaTopicClassifier::new(ollama)));
    }

    let handlers = ChatHandlers::new(
        Arc::new(process_handler),
        Arc::new(ResetSessionHandler::new(store.clone())),
        Arc::new(GetSessionHandler::new(store.clone())),
    );

    let app = Router::new()
        .nest("/chat", chat_routes(handlers))
        .merge(health_routes(store))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(cors_layer(&config));

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, "repair-concierge listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Plain output in development, JSON lines in production.
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Connects to Redis when configured and reachable; otherwise falls back
/// to the in-memory store so the service still comes up.
async fn build_session_store(config: &AppConfig) -> Arc<dyn SessionStore> {
    if let Some(url) = &config.redis.url {
        match RedisSessionStore::connect(url, config.session.ttl_secs).await {
            Ok(store) => match store.ping().await {
                Ok(()) => {
                    tracing::info!("using Redis session store");
                    return Arc::new(store);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Redis unreachable, falling back to in-memory store");
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Redis connection failed, falling back to in-memory store");
            }
        }
    } else {
        tracing::warn!("no Redis URL configured, using in-memory session store");
    }

    Arc::new(InMemorySessionStore::new(config.session.ttl()))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = config.server.cors_origins_list();
    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(parsed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
