//! Batch path details endpoint.
//!
//! POST /api/v1/paths-details
//! { "repository": "team/app.git", "revision": "main", "paths": ["README.md", "src"] }
//!
//! Returns the resolved commit and one entry per path, in request order:
//! entry type, size for files, and the commit that last touched the path.
//! Any path missing from the revision fails the whole request with 404.
//!
//! Used by: directory listings and file views that show "last commit" columns

use axum::{extract::State, routing::post, Json, Router};

use super::SharedService;
use crate::error::Result;
use crate::models::{PathsDetailsRequest, PathsDetailsResponse};

pub fn routes(service: SharedService) -> Router {
    Router::new()
        .route("/api/v1/paths-details", post(paths_details))
        .with_state(service)
}

async fn paths_details(
    State(service): State<SharedService>,
    Json(request): Json<PathsDetailsRequest>,
) -> Result<Json<PathsDetailsResponse>> {
    let response = service
        .paths_details(&request.repository, &request.revision, request.paths)
        .await?;
    Ok(Json(response))
}
