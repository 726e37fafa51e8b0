//! Origin allow-list enforcement and the CORS headers for admitted requests.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

use crate::error::AppError;

pub const ALLOWED_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::OPTIONS,
];

/// Immutable allow-list of origins, fixed for the life of the process.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    allowed: Arc<[String]>,
}

impl OriginPolicy {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: origins.into_iter().map(Into::into).collect(),
        }
    }

    /// A request without an `Origin` header is same-origin or not from a
    /// browser and is always admitted.
    pub fn check(&self, origin: Option<&HeaderValue>) -> Result<(), AppError> {
        let Some(origin) = origin else {
            return Ok(());
        };

        match origin.to_str() {
            Ok(value) if self.allowed.iter().any(|allowed| allowed == value) => Ok(()),
            Ok(value) => {
                tracing::warn!(origin = %value, "CORS blocked for origin");
                Err(AppError::OriginRejected)
            }
            Err(_) => {
                tracing::warn!(origin = ?origin, "CORS blocked for non-text origin");
                Err(AppError::OriginRejected)
            }
        }
    }

    /// Response headers for admitted requests: echoed origin, credentials
    /// and the fixed method set.
    pub fn cors_layer(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .allowed
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(origin = %origin, "Ignoring unusable allowed origin: {}", e);
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
            .allow_methods(ALLOWED_METHODS.to_vec())
            .allow_headers(AllowHeaders::mirror_request())
    }
}

/// Rejects requests from origins outside the allow-list before any router runs.
pub async fn enforce_origin_policy(
    State(policy): State<OriginPolicy>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    policy.check(req.headers().get(header::ORIGIN))?;
    Ok(next.run(req).await)
}
