//! HTTP API routes.
//!
//! - `paths`: POST /api/v1/paths-details (batch path details)
//! - `status`: GET /health, GET /api/v1/cache/stats

mod paths;
mod status;

use std::sync::Arc;

use axum::Router;

use crate::git::PathsDetailsService;

pub type SharedService = Arc<PathsDetailsService>;

pub fn create_router(service: SharedService) -> Router {
    Router::new()
        .merge(paths::routes(service.clone()))
        .merge(status::routes(service))
}
