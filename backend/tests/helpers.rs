// backend/tests/helpers.rs
#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, Request, StatusCode, Uri},
    response::IntoResponse,
    Json, Router,
};
use backend::{
    config::AppConfig,
    db::Database,
    web_server::{create_router, AppState},
};
use http_body_util::BodyExt; // for .collect()
use once_cell::sync::Lazy;
use serde_json::json;
use std::{
    net::{Ipv4Addr, SocketAddr},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use tokio::net::TcpListener;

pub const ALLOWED_ORIGIN: &str = "https://pet-frontend-tau.vercel.app";
pub const LOCAL_ORIGIN: &str = "http://localhost:5173";
pub const EVIL_ORIGIN: &str = "https://evil.example";

static TRACING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_test_writer()
        .try_init();
});

pub fn init_tracing() {
    Lazy::force(&TRACING);
}

/// Config with default origins and no keep-alive.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.uri = "mongodb://127.0.0.1:27017/pets-test".to_string();
    config.keep_alive.enabled = false;
    config
}

pub fn test_state(config: AppConfig) -> AppState {
    AppState::new(config, Database::new()).expect("Failed to build app state")
}

pub fn test_router(config: AppConfig) -> Router {
    create_router(test_state(config))
}

pub fn request(method: Method, uri: &str, origin: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(origin) = origin {
        builder = builder.header("origin", origin);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_bytes(response: axum::response::Response) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("response body is JSON")
}

/// Spawn the gateway on an ephemeral port and return its address and a reqwest client.
pub async fn spawn_app(config: AppConfig) -> (SocketAddr, reqwest::Client) {
    init_tracing();

    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = test_router(config);

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    (addr, client)
}

/// A stand-in collaborator that echoes what it received and counts hits.
pub async fn spawn_upstream() -> (SocketAddr, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new().fallback(echo).with_state(hits.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, hits)
}

async fn echo(
    State(hits): State<Arc<AtomicUsize>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    hits.fetch_add(1, Ordering::SeqCst);

    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned);
    let echoed = json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "cookie": header("cookie"),
        "authorization": header("authorization"),
        "x_custom": header("x-custom"),
        "body": String::from_utf8_lossy(&body),
    });

    (
        StatusCode::CREATED,
        [
            ("set-cookie", "session=abc; HttpOnly"),
            ("access-control-allow-origin", "*"),
            ("x-upstream", "echo"),
        ],
        Json(echoed),
    )
}

/// Serve an arbitrary collaborator router on an ephemeral port.
pub async fn spawn_collaborator(app: Router) -> SocketAddr {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address nothing is listening on.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
