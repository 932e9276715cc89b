//! Thin typed wrapper over the ERP's REST API.
//!
//! Every call goes through the same request/response hooks: the request hook
//! resolves the base URL and attaches credentials or the caller's session
//! cookie, the response hook turns failures into [`PortalError`] variants and
//! logs them.

use crate::domain::model::{ApiCredentials, ConnectionStatus, ListParams};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{PortalError, Result};
use axum::body::Bytes;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub const LOGGED_USER_METHOD: &str = "frappe.auth.get_logged_user";
pub const MISSING_URL_MESSAGE: &str =
    "ERP URL not configured. Please set ERP_URL environment variable.";

/// Raw upstream answer, for callers that need more than the JSON body.
#[derive(Debug, Clone)]
pub struct ErpResponse {
    pub status: StatusCode,
    pub set_cookies: Vec<String>,
    pub body: Bytes,
    pub url: String,
}

impl ErpResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[derive(Debug, Clone)]
pub struct ErpClient {
    http: Client,
    base_url: Option<String>,
    credentials: Option<ApiCredentials>,
    session: Option<String>,
}

pub fn method_path(method: &str) -> String {
    format!("/api/method/{}", urlencoding::encode(method))
}

pub fn resource_path(doctype: &str, name: Option<&str>) -> String {
    match name {
        Some(name) => format!(
            "/api/resource/{}/{}",
            urlencoding::encode(doctype),
            urlencoding::encode(name)
        ),
        None => format!("/api/resource/{}", urlencoding::encode(doctype)),
    }
}

impl ErpClient {
    pub fn new(config: &impl ConfigProvider) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(http: Client, config: &impl ConfigProvider) -> Self {
        Self {
            http,
            base_url: config
                .erp_url()
                .map(|url| url.trim_end_matches('/').to_string()),
            credentials: config.api_credentials().cloned(),
            session: None,
        }
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn credentials(&self) -> Option<&ApiCredentials> {
        self.credentials.as_ref()
    }

    /// A copy of this client acting for a browser session: the caller's
    /// cookie is forwarded and the static credentials are left off. An empty
    /// cookie means a browser that has no session yet.
    pub fn for_session(&self, cookie: impl Into<String>) -> Self {
        Self {
            session: Some(cookie.into()),
            ..self.clone()
        }
    }

    pub fn is_session_scoped(&self) -> bool {
        self.session.is_some()
    }

    fn url_for(&self, path: &str) -> Result<String> {
        let Some(base) = self.base_url.as_deref() else {
            let err = PortalError::MissingConfigError {
                field: "erp.url".to_string(),
            };
            log_failure(&err);
            return Err(err);
        };

        let url = if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        };

        url::Url::parse(&url).map_err(|e| {
            let err = PortalError::RequestBuildError {
                message: format!("invalid ERP URL '{}': {}", url, e),
            };
            log_failure(&err);
            err
        })?;

        Ok(url)
    }

    /// Sends one request and returns the raw response. Non-2xx statuses come
    /// back as [`PortalError::UpstreamStatus`].
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(String, String)]>,
        body: Option<&Value>,
    ) -> Result<ErpResponse> {
        let url = self.url_for(path)?;

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");

        if let Some(query) = query {
            request = request.query(query);
        }

        match (&self.session, &self.credentials) {
            (Some(cookie), _) if !cookie.is_empty() => {
                request = request.header(COOKIE, cookie.as_str())
            }
            (Some(_), _) => {}
            (None, Some(credentials)) => {
                request = request.header(AUTHORIZATION, credentials.authorization_header())
            }
            (None, None) => {}
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        tracing::debug!(method = %method, url = %url, "ERP request");

        let response = request.send().await.map_err(|e| classify(e, &url))?;
        let status = response.status();
        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok().map(str::to_string))
            .collect();
        let body = response.bytes().await.map_err(|e| classify(e, &url))?;

        tracing::debug!(status = status.as_u16(), url = %url, "ERP response");

        if !status.is_success() {
            let err = PortalError::UpstreamStatus {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
                url,
            };
            log_failure(&err);
            return Err(err);
        }

        Ok(ErpResponse {
            status,
            set_cookies,
            body,
            url,
        })
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(String, String)]>,
        body: Option<&Value>,
    ) -> Result<T> {
        self.execute(method, path, query, body).await?.json()
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Option<&[(String, String)]>,
    ) -> Result<T> {
        self.request_json(Method::GET, path, query, None).await
    }

    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: Option<&Value>) -> Result<T> {
        self.request_json(Method::POST, path, None, body).await
    }

    pub async fn put<T: DeserializeOwned>(&self, path: &str, body: Option<&Value>) -> Result<T> {
        self.request_json(Method::PUT, path, None, body).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request_json(Method::DELETE, path, None, None).await
    }

    /// 呼叫白名單方法 `POST /api/method/<method>`
    pub async fn call<T: DeserializeOwned>(&self, method: &str, args: Option<&Value>) -> Result<T> {
        self.post(&method_path(method), args).await
    }

    pub async fn get_doc<T: DeserializeOwned>(&self, doctype: &str, name: &str) -> Result<T> {
        self.get(&resource_path(doctype, Some(name)), None).await
    }

    pub async fn get_list<T: DeserializeOwned>(
        &self,
        doctype: &str,
        params: &ListParams,
    ) -> Result<T> {
        let query = params.to_query();
        self.get(&resource_path(doctype, None), Some(query.as_slice())).await
    }

    pub async fn create_doc<T: DeserializeOwned>(&self, doctype: &str, data: &Value) -> Result<T> {
        self.post(&resource_path(doctype, None), Some(data)).await
    }

    pub async fn update_doc<T: DeserializeOwned>(
        &self,
        doctype: &str,
        name: &str,
        data: &Value,
    ) -> Result<T> {
        self.put(&resource_path(doctype, Some(name)), Some(data)).await
    }

    pub async fn delete_doc<T: DeserializeOwned>(&self, doctype: &str, name: &str) -> Result<T> {
        self.delete(&resource_path(doctype, Some(name))).await
    }

    /// Probes the ERP. Any HTTP answer, 401/403 included, proves the server is
    /// up and counts as reachable.
    pub async fn test_connection(&self) -> ConnectionStatus {
        if self.base_url.is_none() {
            return ConnectionStatus {
                success: false,
                message: MISSING_URL_MESSAGE.to_string(),
                status: None,
            };
        }

        match self
            .execute(Method::GET, &method_path(LOGGED_USER_METHOD), None, None)
            .await
        {
            Ok(response) => ConnectionStatus {
                success: true,
                message: "Connected successfully".to_string(),
                status: Some(response.status.as_u16()),
            },
            Err(PortalError::UpstreamStatus { status, .. }) => ConnectionStatus {
                success: true,
                message: format!("ERP reachable (Status: {})", status),
                status: Some(status),
            },
            Err(PortalError::UpstreamUnreachable { message, .. }) => ConnectionStatus {
                success: false,
                message: format!("Cannot connect to ERP: {}", message),
                status: None,
            },
            Err(other) => ConnectionStatus {
                success: false,
                message: other.to_string(),
                status: None,
            },
        }
    }
}

fn classify(err: reqwest::Error, url: &str) -> PortalError {
    let classified = if err.is_builder() {
        PortalError::RequestBuildError {
            message: err.to_string(),
        }
    } else {
        PortalError::UpstreamUnreachable {
            url: url.to_string(),
            message: err.to_string(),
        }
    };
    log_failure(&classified);
    classified
}

fn log_failure(err: &PortalError) {
    match err {
        PortalError::UpstreamStatus { status, body, url } => {
            tracing::error!(status, body = %body, url = %url, "ERP API error");
            match *status {
                401 => tracing::error!("Unauthorized - check API credentials"),
                403 => tracing::error!("Forbidden - insufficient permissions"),
                404 => tracing::error!("Not Found - resource does not exist"),
                500 => tracing::error!("Server Error - ERP system issue"),
                _ => {}
            }
        }
        PortalError::UpstreamUnreachable { url, message } => {
            tracing::error!(
                url = %url,
                error = %message,
                "ERP connection error: no response received, ensure the ERP server is running"
            );
        }
        PortalError::MissingConfigError { .. } => {
            tracing::warn!("ERP configuration warning: {}", MISSING_URL_MESSAGE);
        }
        other => tracing::error!("ERP request error: {}", other),
    }
}
