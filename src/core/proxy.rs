//! Pass-through forwarder for `/api/erp/*`.
//!
//! The inbound method, path, query, cookie and body are replayed against the
//! ERP and the upstream answer is relayed back as-is. State-changing calls
//! made on a session cookie get a CSRF token fetched first.

use crate::core::erp_client::{method_path, ErpClient};
use crate::domain::model::{ApiCredentials, MethodResponse};
use crate::utils::error::{PortalError, Result};
use axum::body::{Body, Bytes};
use axum::http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use reqwest::Client;

pub const PROXY_PREFIX: &str = "/api/erp";
pub const CSRF_METHOD: &str = "frappe.auth.get_csrf_token";
pub const CSRF_HEADER: &str = "X-Frappe-CSRF-Token";
pub const CONNECT_FAILURE: &str = "Failed to connect to ERP server";

#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    /// Upstream path, without the proxy prefix.
    pub path: String,
    pub query: Option<String>,
    pub cookie: Option<HeaderValue>,
    pub body: Bytes,
}

impl ProxyRequest {
    /// Joins every inbound `Cookie` header into one value.
    pub fn cookie_from(headers: &HeaderMap) -> Option<HeaderValue> {
        let parts: Vec<&str> = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        match parts.as_slice() {
            [] => None,
            [single] => HeaderValue::from_str(single).ok(),
            many => HeaderValue::from_str(&many.join("; ")).ok(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub content_type: Option<HeaderValue>,
    /// One entry per upstream `Set-Cookie` line.
    pub set_cookies: Vec<HeaderValue>,
    pub body: Bytes,
}

impl ProxyResponse {
    pub fn bad_gateway(message: &str, url: &str) -> Self {
        let body = serde_json::json!({
            "error": CONNECT_FAILURE,
            "message": message,
            "url": url,
        });
        Self {
            status: StatusCode::BAD_GATEWAY,
            content_type: Some(HeaderValue::from_static("application/json")),
            set_cookies: Vec::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    pub fn status_text(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        let headers = response.headers_mut();
        if let Some(content_type) = self.content_type {
            headers.insert(CONTENT_TYPE, content_type);
        }
        // 每個 cookie 各自一行，不可合併
        for cookie in self.set_cookies {
            headers.append(SET_COOKIE, cookie);
        }
        response
    }
}

pub fn is_state_changing(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

fn carries_body(method: &Method) -> bool {
    *method != Method::GET && *method != Method::HEAD
}

pub fn target_url(base: &str, path: &str, query: Option<&str>) -> String {
    let url = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    match query {
        Some(query) if !query.is_empty() => format!("{}?{}", url, query),
        _ => url,
    }
}

#[derive(Debug, Clone)]
pub struct ErpProxy {
    http: Client,
    base_url: Option<String>,
    credentials: Option<ApiCredentials>,
}

impl ErpProxy {
    /// Shares the client's connection pool and ERP settings.
    pub fn new(client: &ErpClient) -> Self {
        Self {
            http: client.http().clone(),
            base_url: client.base_url().map(str::to_string),
            credentials: client.credentials().cloned(),
        }
    }

    /// Forwards one request. Network failures become a 502 envelope; only a
    /// missing ERP URL or an unbuildable request is an `Err`.
    pub async fn forward(&self, request: ProxyRequest) -> Result<ProxyResponse> {
        let Some(base) = self.base_url.as_deref() else {
            tracing::warn!("ERP proxy called without an ERP URL configured");
            return Err(PortalError::MissingConfigError {
                field: "erp.url".to_string(),
            });
        };

        let url = target_url(base, &request.path, request.query.as_deref());

        let mut outbound = self
            .http
            .request(request.method.clone(), &url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");

        if let Some(cookie) = &request.cookie {
            outbound = outbound.header(COOKIE, cookie.clone());
        }

        match &self.credentials {
            Some(credentials) => {
                outbound = outbound.header(AUTHORIZATION, credentials.authorization_header());
            }
            None if is_state_changing(&request.method) => {
                if let Some(token) = self.csrf_token(base, request.cookie.as_ref()).await {
                    outbound = outbound.header(CSRF_HEADER, token);
                }
            }
            None => {}
        }

        if carries_body(&request.method) && !request.body.is_empty() {
            outbound = outbound.body(request.body);
        }

        let response = match outbound.send().await {
            Ok(response) => response,
            Err(e) if e.is_builder() => {
                tracing::error!(url = %url, "ERP proxy request could not be built: {}", e);
                return Err(PortalError::RequestBuildError {
                    message: e.to_string(),
                });
            }
            Err(e) => {
                tracing::error!(method = %request.method, url = %url, "ERP proxy error: {}", e);
                return Ok(ProxyResponse::bad_gateway(&e.to_string(), &url));
            }
        };

        let status = response.status();
        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .cloned()
            .collect();

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(url = %url, "ERP proxy error while reading body: {}", e);
                return Ok(ProxyResponse::bad_gateway(&e.to_string(), &url));
            }
        };

        tracing::info!(
            method = %request.method,
            path = %request.path,
            status = status.as_u16(),
            "proxied ERP request"
        );

        Ok(ProxyResponse {
            status,
            content_type,
            set_cookies,
            body,
        })
    }

    /// `None` when the token cannot be fetched; the main call goes ahead
    /// without it.
    async fn csrf_token(&self, base: &str, cookie: Option<&HeaderValue>) -> Option<String> {
        let url = target_url(base, &method_path(CSRF_METHOD), None);
        let mut request = self.http.get(&url).header(ACCEPT, "application/json");
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie.clone());
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Failed to fetch CSRF token: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(
                status = response.status().as_u16(),
                "Failed to fetch CSRF token"
            );
            return None;
        }

        match response.json::<MethodResponse<Option<String>>>().await {
            Ok(MethodResponse {
                message: Some(token),
            }) if !token.is_empty() => Some(token),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Failed to fetch CSRF token: {}", e);
                None
            }
        }
    }
}
