use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cashme::{api, leaderboard::LeaderboardStore, llm, state::AppState, types::GameConfig};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cashme=debug,tower_http=debug,axum=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Cash Me If You Can...");

    // Initialize question providers
    let llm_config = llm::LlmConfig::from_env();
    let source = match llm_config.build_source() {
        Ok(source) => {
            tracing::info!("Question providers initialized successfully");
            Some(source)
        }
        Err(e) => {
            tracing::warn!(
                "Failed to initialize question providers: {}. Games cannot start until one is configured.",
                e
            );
            None
        }
    };

    let store = LeaderboardStore::from_env();
    let config = GameConfig::from_env();

    let mut state = AppState::new(store, config)
        .with_fetch_limits(llm_config.default_timeout, llm_config.default_max_tokens);
    if let Some(source) = source {
        state = state.with_source(source);
    }
    let state = Arc::new(state);

    let app = api::router()
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
