use crate::app::state::AppState;
use crate::core::proxy::{ProxyRequest, ProxyResponse, PROXY_PREFIX};
use crate::utils::error::Result;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Json;

/// `/api/erp/{*path}` for every method. The raw path is used so that
/// percent-encoding reaches the ERP untouched.
pub async fn proxy(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<ProxyResponse> {
    let path = uri
        .path()
        .strip_prefix(PROXY_PREFIX)
        .unwrap_or(uri.path())
        .trim_start_matches('/')
        .to_string();

    let request = ProxyRequest {
        method,
        path,
        query: uri.query().map(str::to_string),
        cookie: ProxyRequest::cookie_from(&headers),
        body,
    };

    state.proxy.forward(request).await
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.erp.test_connection().await;
    let code = if status.success {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

pub async fn version() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
