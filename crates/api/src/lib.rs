//! HTTP API server with observability for the inventory backend.
//!
//! Provides REST endpoints for category, product and stock management, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use domain::{CategoryService, ProductService, StockService};
use inventory_store::InventoryStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: InventoryStore> {
    pub categories: CategoryService<S>,
    pub products: ProductService<S>,
    pub stocks: StockService<S>,
}

/// Creates the application state with every service over one store.
pub fn create_state<S: InventoryStore + Clone + 'static>(store: S) -> Arc<AppState<S>> {
    Arc::new(AppState {
        categories: CategoryService::new(store.clone()),
        products: ProductService::new(store.clone()),
        stocks: StockService::new(store),
    })
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: InventoryStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/categories",
            get(routes::categories::list::<S>).post(routes::categories::create::<S>),
        )
        .route("/categories/{id}", get(routes::categories::get::<S>))
        .route(
            "/products",
            get(routes::products::list::<S>).post(routes::products::create::<S>),
        )
        .route(
            "/products/variants",
            post(routes::products::create_with_variants::<S>),
        )
        .route(
            "/products/{id}",
            get(routes::products::get::<S>).put(routes::products::update::<S>),
        )
        .route(
            "/products/{id}/variants",
            put(routes::products::update_with_variants::<S>),
        )
        .route(
            "/stocks",
            get(routes::stocks::list::<S>).put(routes::stocks::update::<S>),
        )
        .route("/stocks/{id}", get(routes::stocks::get::<S>))
        .route("/stocks/{id}/history", get(routes::stocks::history::<S>))
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
