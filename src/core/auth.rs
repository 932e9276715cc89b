use crate::core::erp_client::{method_path, ErpClient, LOGGED_USER_METHOD};
use crate::domain::model::{LoginCredentials, MethodResponse};
use crate::domain::ports::LoginOutcome;
use crate::utils::error::Result;
use reqwest::Method;

/// Frappe 對未登入的呼叫者回傳的使用者名稱
pub const GUEST_USER: &str = "Guest";

/// Logs in through the ERP's standard login endpoint. The returned cookies
/// carry the new session.
pub async fn login(client: &ErpClient, credentials: &LoginCredentials) -> Result<LoginOutcome> {
    let body = serde_json::json!({
        "usr": credentials.usr,
        "pwd": credentials.pwd,
    });
    let response = client
        .execute(Method::POST, &method_path("login"), None, Some(&body))
        .await?;

    tracing::info!(user = %credentials.usr, "ERP login succeeded");

    Ok(LoginOutcome {
        response: response.json()?,
        set_cookies: response.set_cookies,
    })
}

pub async fn logout(client: &ErpClient) -> Result<Vec<String>> {
    let response = client
        .execute(Method::POST, &method_path("logout"), None, None)
        .await?;
    Ok(response.set_cookies)
}

/// `None` for guests and on any failure.
pub async fn get_logged_user(client: &ErpClient) -> Option<String> {
    match client
        .call::<MethodResponse<String>>(LOGGED_USER_METHOD, None)
        .await
    {
        Ok(response) if response.message != GUEST_USER => Some(response.message),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("logged user lookup failed: {}", e);
            None
        }
    }
}

pub async fn is_authenticated(client: &ErpClient) -> bool {
    get_logged_user(client).await.is_some()
}
