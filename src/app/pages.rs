//! Browser-facing pages. All ERP access goes through the session-scoped
//! [`PortalBackend`](crate::domain::ports::PortalBackend).

use crate::app::state::AppState;
use crate::app::views;
use crate::core::proxy::ProxyRequest;
use crate::domain::model::LoginCredentials;
use crate::utils::error::PortalError;
use axum::extract::{Path, Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

pub const USERNAME_REQUIRED: &str = "Username is required";
pub const PASSWORD_REQUIRED: &str = "Password is required";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials. Please try again.";
pub const DASHBOARD_FAILED: &str = "Failed to load dashboard data";
pub const PROJECT_FAILED: &str = "Failed to load project";
pub const LOGOUT_FAILED: &str = "Failed to logout";

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub redirect: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub usr: String,
    pub pwd: String,
    pub redirect: Option<String>,
}

/// 只接受站內路徑，避免被導去外站
pub fn safe_redirect<'a>(target: Option<&'a str>, fallback: &'a str) -> &'a str {
    match target {
        Some(t)
            if t.starts_with('/')
                && !t.starts_with("//")
                && !t.contains('\\')
                && !t.chars().any(char::is_control) =>
        {
            t
        }
        _ => fallback,
    }
}

/// The caller's cookies, forwarded verbatim to the ERP.
fn session_cookie(headers: &HeaderMap) -> String {
    ProxyRequest::cookie_from(headers)
        .and_then(|v| v.to_str().ok().map(str::to_string))
        .unwrap_or_default()
}

fn redirect_with_cookies(target: &str, cookies: &[String]) -> Response {
    let mut response = Redirect::to(target).into_response();
    for cookie in cookies {
        match HeaderValue::from_str(cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(_) => tracing::warn!("dropping unrepresentable Set-Cookie from ERP"),
        }
    }
    response
}

/// The ERP no longer knows the session: drop the cookie so the gate does not
/// send the browser straight back.
fn signed_out(state: &AppState) -> Response {
    tracing::debug!("ERP session expired, clearing {}", state.gate.cookie_name);
    redirect_with_cookies(&state.gate.login_path, &[state.gate.clear_cookie()])
}

/// ERP-provided message when there is one.
fn login_failure_message(error: &PortalError) -> String {
    if let PortalError::UpstreamStatus { body, .. } = error {
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
            if let Some(message) = json.get("message").and_then(|m| m.as_str()) {
                if !message.is_empty() {
                    return message.to_string();
                }
            }
        }
    }
    INVALID_CREDENTIALS.to_string()
}

pub async fn index(State(state): State<AppState>) -> Redirect {
    Redirect::to(&state.gate.landing_path)
}

pub async fn login_form(Query(query): Query<LoginQuery>) -> Html<String> {
    Html(views::login_page("", query.redirect.as_deref(), None))
}

pub async fn login_submit(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let redirect = form.redirect.as_deref().filter(|r| !r.is_empty());

    let missing = if form.usr.trim().is_empty() {
        Some(USERNAME_REQUIRED)
    } else if form.pwd.is_empty() {
        Some(PASSWORD_REQUIRED)
    } else {
        None
    };
    if let Some(message) = missing {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(views::login_page(&form.usr, redirect, Some(message))),
        )
            .into_response();
    }

    let credentials = LoginCredentials {
        usr: form.usr.trim().to_string(),
        pwd: form.pwd.clone(),
    };

    match state.backend.login(&credentials).await {
        Ok(outcome) => {
            tracing::info!(user = %credentials.usr, "portal login");
            let target = safe_redirect(redirect, &state.gate.landing_path);
            redirect_with_cookies(target, &outcome.set_cookies)
        }
        Err(e) => {
            tracing::warn!(user = %credentials.usr, "portal login failed: {}", e);
            let message = login_failure_message(&e);
            (
                StatusCode::UNAUTHORIZED,
                Html(views::login_page(&credentials.usr, redirect, Some(&message))),
            )
                .into_response()
        }
    }
}

pub async fn dashboard(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = session_cookie(&headers);
    let Some(user) = state.backend.logged_user(&session).await else {
        return signed_out(&state);
    };

    let (projects, error) = match state.backend.projects(&session).await {
        Ok(projects) => (projects, None),
        Err(e) => {
            tracing::warn!(user = %user, "dashboard projects failed: {}", e);
            (Vec::new(), Some(DASHBOARD_FAILED))
        }
    };
    let customer = state.backend.customer_info(&session).await;

    Html(views::dashboard_page(&user, customer.as_ref(), &projects, error)).into_response()
}

pub async fn project_detail(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    let session = session_cookie(&headers);
    let Some(user) = state.backend.logged_user(&session).await else {
        return signed_out(&state);
    };

    match state.backend.project(&session, &name).await {
        Ok(project) => Html(views::project_page(&user, Some(&project), None)).into_response(),
        Err(e) => {
            tracing::warn!(project = %name, "project lookup failed: {}", e);
            let status = match e {
                PortalError::UpstreamStatus { status: 404, .. } => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_GATEWAY,
            };
            (status, Html(views::project_page(&user, None, Some(PROJECT_FAILED)))).into_response()
        }
    }
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = session_cookie(&headers);
    match state.backend.logout(&session).await {
        Ok(cookies) => redirect_with_cookies(&state.gate.login_path, &cookies),
        Err(e) => {
            tracing::error!("❌ ERP logout failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Html(views::error_page("Logout", LOGOUT_FAILED)),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_redirect() {
        assert_eq!(safe_redirect(Some("/dashboard/projects/P-1"), "/dashboard"), "/dashboard/projects/P-1");
        assert_eq!(safe_redirect(Some("//evil.example"), "/dashboard"), "/dashboard");
        assert_eq!(safe_redirect(Some("https://evil.example"), "/dashboard"), "/dashboard");
        assert_eq!(safe_redirect(Some("/\\evil.example"), "/dashboard"), "/dashboard");
        assert_eq!(safe_redirect(None, "/dashboard"), "/dashboard");
        assert_eq!(safe_redirect(Some("/\t/evil.example"), "/dashboard"), "/dashboard");
        assert_eq!(safe_redirect(Some("/\nevil"), "/dashboard"), "/dashboard");
        assert_eq!(safe_redirect(Some("/dashboard\r"), "/dashboard"), "/dashboard");
    }

    #[test]
    fn test_login_failure_message() {
        let with_message = PortalError::UpstreamStatus {
            status: 401,
            body: r#"{"message":"Invalid Login. Try again."}"#.into(),
            url: "http://erp.local/api/method/login".into(),
        };
        assert_eq!(login_failure_message(&with_message), "Invalid Login. Try again.");

        let html_body = PortalError::UpstreamStatus {
            status: 500,
            body: "<html>oops</html>".into(),
            url: "http://erp.local/api/method/login".into(),
        };
        assert_eq!(login_failure_message(&html_body), INVALID_CREDENTIALS);

        let unreachable = PortalError::UpstreamUnreachable {
            url: "http://erp.local".into(),
            message: "connection refused".into(),
        };
        assert_eq!(login_failure_message(&unreachable), INVALID_CREDENTIALS);
    }

    #[test]
    fn test_session_cookie_joins_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_cookie(&headers), "");
        headers.append(axum::http::header::COOKIE, HeaderValue::from_static("sid=abc123"));
        assert_eq!(session_cookie(&headers), "sid=abc123");
    }
}
