mod config;
mod error;
mod generator;
mod handlers;
mod policy;
mod remote;
mod session;
mod sms;
mod store;
mod types;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use log::info;
use tower_http::cors::CorsLayer;

use config::Config;
use generator::TemplateGenerator;
use handlers::AppState;
use policy::FallbackPolicy;
use remote::{OpenAiGenerator, RemoteGenerator};
use session::SessionManager;
use store::MemoryStore;

fn router(state: Arc<AppState>, sessions: Arc<SessionManager>) -> Router {
    // only the saved-number routes need a session
    let saved_numbers = Router::new()
        .route("/api/saved-numbers", get(handlers::list_saved_numbers))
        .route("/api/save-number", post(handlers::save_number))
        .route("/api/saved-numbers/:id", delete(handlers::delete_saved_number))
        .route_layer(middleware::from_fn_with_state(
            sessions,
            session::session_middleware,
        ));

    Router::new()
        .route("/api/generate-message", post(handlers::generate_message))
        .route("/api/health", get(handlers::health))
        .merge(saved_numbers)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn build_policy(config: &Config) -> FallbackPolicy {
    let local = TemplateGenerator::new(config.local_delay_ms.clone());
    match config.remote_credential() {
        Some(key) => {
            info!(
                "Remote generation enabled ({} at {})",
                config.openai_model, config.openai_base_url
            );
            let remote: Arc<dyn RemoteGenerator> = Arc::new(OpenAiGenerator::new(
                config.openai_base_url.clone(),
                key,
                config.openai_model.clone(),
                config.remote_timeout,
            ));
            FallbackPolicy::new(Some(remote), local, config.remote_timeout)
        }
        None => {
            info!("No usable OPENAI_API_KEY, generating from templates only");
            FallbackPolicy::local_only(local)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init_timed();

    let config = Config::from_env();

    let sessions = Arc::new(SessionManager::new(config.session_ttl));
    let pruner = session::spawn_pruner(&sessions, config.session_prune_interval);
    info!(
        "Sessions live for {:?}, pruned every {:?}",
        sessions.ttl(),
        config.session_prune_interval
    );

    let state = Arc::new(AppState {
        generator: build_policy(&config),
        store: Arc::new(MemoryStore::new()),
    });

    let app = router(state, sessions.clone());

    let addr = format!("0.0.0.0:{}", config.port);
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pruner.abort();
    info!("Stopped with {} live sessions", sessions.len().await);

    Ok(())
}
