//! Per-request navigation gate driven by the ERP session cookie.
//!
//! The decision is pure: it looks at the request path and one cookie value
//! and either lets the request through or redirects it. Nothing is stored.

use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Path prefixes the gate never looks at.
const SKIPPED_PREFIXES: [&str; 3] = ["/api", "/static", "/favicon.ico"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionGate {
    pub cookie_name: String,
    pub guest_value: String,
    pub login_path: String,
    pub landing_path: String,
    pub protected_paths: Vec<String>,
    pub auth_paths: Vec<String>,
}

impl Default for SessionGate {
    fn default() -> Self {
        Self {
            cookie_name: "sid".to_string(),
            guest_value: "Guest".to_string(),
            login_path: "/login".to_string(),
            landing_path: "/dashboard".to_string(),
            protected_paths: vec!["/dashboard".to_string()],
            auth_paths: vec!["/login".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Pass,
    Redirect(String),
}

impl SessionGate {
    pub fn applies_to(&self, path: &str) -> bool {
        !SKIPPED_PREFIXES.iter().any(|p| path.starts_with(p))
    }

    /// 空值或訪客值都視為未登入
    pub fn is_authenticated(&self, session: Option<&str>) -> bool {
        matches!(session, Some(v) if !v.is_empty() && v != self.guest_value)
    }

    pub fn decide(&self, path: &str, session: Option<&str>) -> GateDecision {
        if !self.applies_to(path) {
            return GateDecision::Pass;
        }

        let authenticated = self.is_authenticated(session);

        if !authenticated && self.protected_paths.iter().any(|p| path.starts_with(p.as_str())) {
            return GateDecision::Redirect(self.login_redirect(path));
        }

        if authenticated && self.auth_paths.iter().any(|p| path.starts_with(p.as_str())) {
            return GateDecision::Redirect(self.landing_path.clone());
        }

        GateDecision::Pass
    }

    pub fn login_redirect(&self, original_path: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("redirect", original_path)
            .finish();
        format!("{}?{}", self.login_path, query)
    }

    /// `Set-Cookie` value that drops the session cookie from the browser.
    pub fn clear_cookie(&self) -> String {
        format!("{}=; Path=/; Max-Age=0", self.cookie_name)
    }

    /// Reads the session cookie out of every `Cookie` header on the request.
    pub fn session_value<'a>(&self, headers: &'a axum::http::HeaderMap) -> Option<&'a str> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|raw| cookie_value(raw, &self.cookie_name))
    }
}

/// Value of `name` inside a raw `Cookie` header.
pub fn cookie_value<'a>(raw: &'a str, name: &str) -> Option<&'a str> {
    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key.trim() == name).then(|| value.trim().trim_matches('"'))
    })
}

impl Validate for SessionGate {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("session.cookie_name", &self.cookie_name)?;
        validation::validate_route_path("session.login_path", &self.login_path)?;
        validation::validate_route_path("session.landing_path", &self.landing_path)?;
        validation::validate_route_paths("session.protected_paths", &self.protected_paths)?;
        validation::validate_route_paths("session.auth_paths", &self.auth_paths)
    }
}

pub async fn session_gate(
    State(gate): State<Arc<SessionGate>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    let decision = gate.decide(&path, gate.session_value(request.headers()));
    match decision {
        GateDecision::Pass => next.run(request).await,
        GateDecision::Redirect(target) => {
            tracing::debug!(path = %path, target = %target, "session gate redirect");
            Redirect::temporary(&target).into_response()
        }
    }
}
