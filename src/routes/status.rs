//! Service status endpoints.
//!
//! - GET /health → "ok"
//! - GET /api/v1/cache/stats → last-commit cache statistics
//!   (entries, in-flight computations, hits, misses, joined waiters)

use axum::{extract::State, routing::get, Json, Router};

use super::SharedService;
use crate::git::CacheStats;

pub fn routes(service: SharedService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/cache/stats", get(cache_stats))
        .with_state(service)
}

async fn health() -> &'static str {
    "ok"
}

async fn cache_stats(State(service): State<SharedService>) -> Json<CacheStats> {
    Json(service.cache_stats())
}
