//! HTTP front end for the order saga orchestrator.
//!
//! Exposes the saga trigger, a health check, and Prometheus metrics,
//! with structured logging (tracing) on every request.

pub mod config;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{GatewayClient, OrderService, PaymentService, ServiceError, StockService};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::saga::AppState;

/// State wired to the real store and payment APIs behind the gateway.
pub type GatewayState = AppState<GatewayClient, GatewayClient, GatewayClient>;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<O, S, P>(
    state: Arc<AppState<O, S, P>>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    O: OrderService + 'static,
    S: StockService + 'static,
    P: PaymentService + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health-check", get(routes::health::check))
        .route("/saga/order", post(routes::saga::place_order::<O, S, P>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state with one gateway client serving all three services.
pub fn create_default_state(config: &Config) -> Result<Arc<GatewayState>, ServiceError> {
    let client = GatewayClient::with_timeout(&config.gateway_url, config.gateway_timeout())?;
    Ok(Arc::new(AppState::new(
        client.clone(),
        client.clone(),
        client,
    )))
}
