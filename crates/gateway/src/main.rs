//! Palmares HTTP gateway
//!
//! The entry point for the hospital-ranking chatbot:
//! - one answer endpoint running the full resolution pipeline
//! - health and readiness probes
//! - observability (logging, metrics, tracing)

mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use palmares_common::{
    config::AppConfig,
    dataset::RankingStore,
    geo::NominatimGeocoder,
    llm::OpenAiChatModel,
    metrics,
    reference::{Gazetteer, InstitutionRegistry},
};
use palmares_pipeline::analysis::QueryAnalyst;
use palmares_pipeline::audit::AuditLog;
use palmares_pipeline::checks::SanityGate;
use palmares_pipeline::conversation::ContinuationClassifier;
use palmares_pipeline::resolve::ResolutionEngine;
use palmares_pipeline::AnswerPipeline;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<RankingStore>,
    pub pipeline: Arc<AnswerPipeline>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Arc::new(AppConfig::load()?);

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.observability.log_level))
        .with_target(true);
    if config.observability.json_logging {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!("Starting Palmares gateway v{}", palmares_common::VERSION);

    // Initialize metrics, exporter first so descriptions register against it
    if config.observability.metrics_port != 0 {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()?;
        info!("Metrics exporter listening on {}", metrics_addr);
    }
    metrics::register_metrics();

    // Load the ranking dataset and reference tables
    let store = Arc::new(RankingStore::load(&config.dataset)?);
    let pipeline = Arc::new(build_pipeline(&config, store.clone())?);

    // Create app state
    let state = AppState {
        config: config.clone(),
        store,
        pipeline,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Assemble the answer pipeline from configuration
fn build_pipeline(
    config: &AppConfig,
    store: Arc<RankingStore>,
) -> palmares_common::Result<AnswerPipeline> {
    let model = Arc::new(OpenAiChatModel::new(config.llm.clone())?);
    let geocoder = Arc::new(NominatimGeocoder::new(config.geocoding.clone())?);

    let gazetteer = Arc::new(match &config.dataset.gazetteer_path {
        Some(path) => Gazetteer::load(path)?,
        None => Gazetteer::builtin(),
    });
    let registry = Arc::new(InstitutionRegistry::from_store(&store));
    let specialties = Arc::new(
        store
            .specialties()
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>(),
    );

    Ok(AnswerPipeline::new(
        SanityGate::new(model.clone(), config.limits.clone()),
        ContinuationClassifier::new(model.clone()),
        QueryAnalyst::new(
            model,
            specialties,
            gazetteer,
            registry,
            config.search.clone(),
        ),
        ResolutionEngine::new(store, geocoder, config.search.clone()),
        AuditLog::open(&config.audit)?,
    ))
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        // Answer endpoint
        .route("/answer", post(handlers::answer::answer))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
