use std::any::Any;

use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use common::MessageResponse;
use thiserror::Error;

// Every failure a request can hit on its way through the gateway
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not allowed by CORS")]
    OriginRejected,

    #[error("Route not found: {method} {path}")]
    RouteNotFound { method: Method, path: String },

    #[error("No upstream configured for the {0} routes")]
    UpstreamNotConfigured(&'static str),

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Failed to read request body: {0}")]
    RequestBody(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Database is not connected")]
    DatabaseUnavailable,

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Implement IntoResponse to convert AppError into an HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            // Already logged with the offending origin by the origin filter.
            AppError::OriginRejected => {}
            AppError::RouteNotFound { .. } => tracing::debug!("{}", self),
            _ => tracing::error!("Request failed: {}", self),
        }

        (status, Json(MessageResponse::new(self.to_string()))).into_response()
    }
}

/// Turns a handler panic into the same `{ "message": ... }` 500 as any other failure.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic message".to_string()
    };

    AppError::Internal(message).into_response()
}
