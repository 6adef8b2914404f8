//! HTTP handlers and routers for the service.

use axum::routing::any;
use axum::Router;
use http::header::{ACCEPT, CONTENT_TYPE, ORIGIN};
use http::Method;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;

pub mod config;
pub mod handlers;
pub mod health;
pub mod html;
pub mod objects;

pub use config::Config;
pub use handlers::not_found_handler;

use crate::ServiceState;

/// Reserved prefix for health routes; never reaches a bucket
pub const STATUS_PREFIX: &str = "/_status";

/// Build the gateway router: health routes plus the single
///  method-dispatched object endpoint
pub fn router(config: &Config, state: ServiceState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(config.log_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    let cors_layer = CorsLayer::new()
        .allow_methods(vec![
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(vec![ACCEPT, CONTENT_TYPE, ORIGIN])
        .allow_origin(Any)
        .allow_credentials(false);

    Router::new()
        .nest(STATUS_PREFIX, health::router(state.clone()))
        .route("/", any(objects::root_handler))
        .route("/*path", any(objects::handler))
        .fallback(handlers::not_found_handler)
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
        .layer(cors_layer)
        .layer(trace_layer)
}

/// Serve the gateway until `shutdown_rx` fires
pub async fn run(
    config: Config,
    state: ServiceState,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    let listen_addr = config.listen_addr;
    let router = router(&config, state);

    tracing::info!(addr = ?listen_addr, "gateway listening");
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("an error occurred running the HTTP server: {0}")]
    ServingFailed(#[from] std::io::Error),
}
