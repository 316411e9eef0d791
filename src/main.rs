// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::loop_locks::LoopLocks;
use crate::application::loop_service::LoopService;
use crate::application::trend_service::TrendService;
use crate::application::tuning_repository::TuningRepository;
use crate::application::tuning_service::TuningService;
use crate::infrastructure::config::load_tuner_config;
use crate::infrastructure::memory_repository::InMemoryRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing, RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_tuner_config()?;

    // Create repository (infrastructure layer)
    let repository: Arc<dyn TuningRepository> = Arc::new(InMemoryRepository::new());
    let locks = Arc::new(LoopLocks::new());

    // Create services (application layer)
    let loop_service = LoopService::new(repository.clone(), locks.clone(), config.tuning.clone());
    let trend_service = TrendService::new(repository.clone(), locks.clone());
    let tuning_service = TuningService::new(repository, locks);

    // Create application state
    let state = Arc::new(AppState {
        loop_service,
        trend_service,
        tuning_service,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(handlers::health_check))
        .route("/loops", get(handlers::list_loops).post(handlers::create_loop))
        .route(
            "/loops/:id",
            get(handlers::get_loop)
                .put(handlers::update_loop)
                .delete(handlers::delete_loop),
        )
        .route("/loops/:id/process-type", put(handlers::set_process_type))
        .route("/loops/:id/adopt", post(handlers::adopt_tuning))
        .route(
            "/loops/:id/charts",
            get(handlers::list_charts).post(handlers::create_chart),
        )
        .route("/charts/:id", delete(handlers::delete_chart))
        .route(
            "/charts/:id/bump-tests",
            get(handlers::list_bump_tests).post(handlers::create_bump_test),
        )
        .route(
            "/bump-tests/:id",
            get(handlers::get_bump_test).delete(handlers::delete_bump_test),
        )
        .route("/bump-tests/:id/markers", put(handlers::set_markers))
        .route("/loops/:id/tuning", get(handlers::get_tuning))
        .route("/loops/:id/tuning/lambda", put(handlers::set_lambda))
        .route("/loops/:id/tuning/method", put(handlers::set_method))
        .route(
            "/loops/:id/tuning/bump-tests/:test_id",
            post(handlers::add_tuning_bump_test).delete(handlers::remove_tuning_bump_test),
        )
        .route("/loops/:id/recompute", post(handlers::recompute))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server.bind_address.parse()?;
    tracing::info!("Starting pid-tuner service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
