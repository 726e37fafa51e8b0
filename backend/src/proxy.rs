use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{HeaderMap, HeaderName},
    response::Response,
};
use common::utils::join_url;

use crate::{error::AppError, routes::RouteModule, web_server::AppState};

/// Hop-by-hop headers that only describe the client connection.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Client for talking to collaborators. Redirects are relayed to the caller,
/// never followed by the gateway.
pub fn forwarding_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
}

fn strip_request_header(name: &HeaderName) -> bool {
    let name = name.as_str();
    // Recomputed by reqwest for the upstream connection
    name == "host" || name == "content-length" || HOP_BY_HOP_HEADERS.contains(&name)
}

fn strip_response_header(name: &HeaderName) -> bool {
    let name = name.as_str();
    // The gateway's CORS layer is the only source of access-control headers.
    name == "content-length"
        || name.starts_with("access-control-")
        || HOP_BY_HOP_HEADERS.contains(&name)
}

fn filtered(headers: &HeaderMap, strip: fn(&HeaderName) -> bool) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        if !strip(name) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

/// Forwards a request to the collaborator that owns `module` and relays its
/// response. Method, path, query, headers and body pass through unchanged.
pub async fn forward(
    state: &AppState,
    module: RouteModule,
    req: Request,
) -> Result<Response, AppError> {
    let base = state
        .app_config
        .upstreams
        .base_url(module)
        .ok_or(AppError::UpstreamNotConfigured(module.name()))?;

    let (parts, body) = req.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let target = join_url(base, path_and_query);

    let body = to_bytes(body, state.app_config.web.max_body_bytes)
        .await
        .map_err(|e| AppError::RequestBody(e.to_string()))?;

    tracing::debug!(module = module.name(), method = %parts.method, url = %target, "Forwarding request");

    let upstream = state
        .http
        .request(parts.method, &target)
        .headers(filtered(&parts.headers, strip_request_header))
        .body(body)
        .send()
        .await?;

    let status = upstream.status();
    let headers = filtered(upstream.headers(), strip_response_header);
    let bytes = upstream.bytes().await?;

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}
