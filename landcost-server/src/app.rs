use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use landcost_core::CostService;
use landcost_core::db::{DbConfig, MemoryRepositoryFactory, RepositoryRegistry};
use landcost_db_sqlite::SqliteRepositoryFactory;

use crate::routes;

/// Build the registry with every storage backend this binary supports.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry.register(Box::new(MemoryRepositoryFactory));
    registry
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CostService>,
}

impl AppState {
    pub fn new(service: CostService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Open the configured backend and wrap it in a [`CostService`].
    pub async fn open(config: &DbConfig) -> Result<Self> {
        let repo = build_registry()
            .create(config)
            .await
            .with_context(|| format!("Failed to open {} backend", config.backend))?;
        Ok(Self::new(CostService::from(repo)))
    }
}

pub fn create_router(state: AppState) -> Router {
    // The front-end is served separately.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/land-costs", get(routes::list_land_costs))
        .route("/api/land-costs/export", get(routes::export_land_costs))
        .route(
            "/api/indicators",
            get(routes::list_indicators).post(routes::update_indicators),
        )
        .route("/api/recalculate", post(routes::recalculate))
        .route("/api/summary", get(routes::summary))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
