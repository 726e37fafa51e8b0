use axum::{
    debug_handler,
    extract::{OriginalUri, Request, State},
    handler::HandlerWithoutStateExt,
    http::{Method, StatusCode},
    middleware,
    routing::{any, get},
    Json, Router,
};
use chrono::{DateTime, Utc};
use common::{DatabaseStatus, HealthResponse, ServiceStatus};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::{
    api_doc::ApiDoc,
    config::AppConfig,
    cors::{self, OriginPolicy},
    db::Database,
    error::{self, AppError},
    proxy,
    routes::{self, RouteTable},
};

pub const ROOT_MESSAGE: &str = "🐾 Pet Accessories Backend is running successfully!";

#[derive(Clone)]
pub struct AppState {
    pub app_config: Arc<AppConfig>,
    pub route_table: Arc<RouteTable>,
    pub origin_policy: OriginPolicy,
    pub db: Database,
    pub http: reqwest::Client,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(app_config: AppConfig, db: Database) -> Result<Self, reqwest::Error> {
        let origin_policy = OriginPolicy::new(app_config.web.allowed_origins.iter().cloned());
        Ok(Self {
            app_config: Arc::new(app_config),
            route_table: Arc::new(RouteTable::default()),
            origin_policy,
            db,
            http: proxy::forwarding_client()?,
            started_at: Utc::now(),
        })
    }
}

pub async fn run_server(app_state: AppState) -> std::io::Result<()> {
    let addr = format!(
        "{}:{}",
        app_state.app_config.web.addr, app_state.app_config.web.port
    );
    let app = create_router(app_state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server running on {}", listener.local_addr()?);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

pub fn create_router(app_state: AppState) -> Router {
    let uploads = ServeDir::new(&app_state.app_config.web.uploads_dir)
        .not_found_service(not_found.into_service());

    let mut router = Router::new()
        .route(routes::ROOT, get(root))
        .route(routes::HEALTH, get(health))
        .route(routes::OPENAPI, get(openapi))
        .nest_service(routes::UPLOADS, uploads);

    for module in app_state.route_table.modules() {
        router = router
            .route(module.prefix(), any(dispatch))
            .route(&format!("{}/{{*rest}}", module.prefix()), any(dispatch));
    }

    // Paths the explicit mounts miss (e.g. a bare trailing slash) still go
    // through the prefix table before falling back to 404.
    let router = router.fallback(dispatch).with_state(app_state.clone());
    apply_edge_layers(router, &app_state.origin_policy)
}

/// Wraps a router in the admission stack. Outermost first: request id,
/// tracing, origin filter, CORS headers, panic translation.
pub fn apply_edge_layers(router: Router, policy: &OriginPolicy) -> Router {
    router
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .layer(policy.cors_layer())
        .layer(middleware::from_fn_with_state(
            policy.clone(),
            cors::enforce_origin_policy,
        ))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

// --- Handlers ---

#[utoipa::path(
    get,
    path = "/",
    tag = "gateway",
    responses((status = 200, description = "Service is alive", body = String, content_type = "text/plain"))
)]
pub async fn root() -> &'static str {
    ROOT_MESSAGE
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "gateway",
    responses(
        (status = 200, description = "Database connected", body = HealthResponse),
        (status = 503, description = "Database connecting or unreachable", body = HealthResponse),
    )
)]
#[debug_handler]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (database, error) = match state.db.status().await {
        // A connected handle is re-checked on every call
        DatabaseStatus::Connected => match state.db.ping().await {
            Ok(()) => (DatabaseStatus::Connected, None),
            Err(e) => {
                tracing::warn!("Health check ping failed: {}", e);
                (DatabaseStatus::Disconnected, Some(e.to_string()))
            }
        },
        other => (other, state.db.last_error().await),
    };
    let (status, code) = match database {
        DatabaseStatus::Connected => (ServiceStatus::Ok, StatusCode::OK),
        _ => (ServiceStatus::Degraded, StatusCode::SERVICE_UNAVAILABLE),
    };

    (
        code,
        Json(HealthResponse {
            status,
            database,
            error,
            started_at: state.started_at,
        }),
    )
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[debug_handler]
async fn dispatch(
    State(state): State<AppState>,
    req: Request,
) -> Result<axum::response::Response, AppError> {
    let module = state
        .route_table
        .resolve(req.uri().path())
        .ok_or_else(|| AppError::RouteNotFound {
            method: req.method().clone(),
            path: req.uri().path().to_string(),
        })?;

    proxy::forward(&state, module, req).await
}

async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> AppError {
    AppError::RouteNotFound {
        method,
        path: uri.path().to_string(),
    }
}
