//! Application error types and HTTP response mapping.
//!
//! Defines `AppError` enum for all error conditions and implements Axum's
//! `IntoResponse` to automatically convert errors to appropriate HTTP responses
//! with JSON error bodies.
//!
//! Error mappings:
//! - `RepoNotFound`, `RevisionNotFound`, `PathNotFound`, `PathNeverExisted` → 404
//! - `InvalidRepository`, `InvalidPath`, `InvalidRequest` → 400
//! - `Timeout` → 504
//! - `ObjectStore`, `Internal` → 500
//!
//! `CacheComputeFailed` is mapped according to the error it wraps.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Object store error: {0}")]
    ObjectStore(#[from] git2::Error),

    #[error("Repository not found: {0}")]
    RepoNotFound(String),

    #[error("Invalid repository identifier: {0}")]
    InvalidRepository(String),

    #[error("Revision not found: {0}")]
    RevisionNotFound(String),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Path never existed in history: {0}")]
    PathNeverExisted(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to find last commit for path {path}: {source}")]
    CacheComputeFailed {
        path: String,
        #[source]
        source: Arc<AppError>,
    },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Unwraps cache failures down to the error the history walk produced.
    pub fn root_cause(&self) -> &AppError {
        match self {
            AppError::CacheComputeFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self.root_cause() {
            AppError::RepoNotFound(_)
            | AppError::RevisionNotFound(_)
            | AppError::PathNotFound(_)
            | AppError::PathNeverExisted(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRepository(_)
            | AppError::InvalidPath(_)
            | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// True when a git2 error only says "no such object/entry/reference".
pub fn is_not_found(err: &git2::Error) -> bool {
    err.code() == git2::ErrorCode::NotFound
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
