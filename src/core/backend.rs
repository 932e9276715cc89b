use crate::core::erp_client::ErpClient;
use crate::core::{auth, customer};
use crate::domain::model::{Customer, LoginCredentials, Project};
use crate::domain::ports::{LoginOutcome, PortalBackend};
use crate::utils::error::Result;
use async_trait::async_trait;

#[async_trait]
impl PortalBackend for ErpClient {
    async fn logged_user(&self, session: &str) -> Option<String> {
        auth::get_logged_user(&self.for_session(session)).await
    }

    async fn projects(&self, session: &str) -> Result<Vec<Project>> {
        customer::get_customer_projects(&self.for_session(session)).await
    }

    async fn project(&self, session: &str, name: &str) -> Result<Project> {
        customer::get_project(&self.for_session(session), name).await
    }

    async fn customer_info(&self, session: &str) -> Option<Customer> {
        customer::get_customer_info(&self.for_session(session)).await
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginOutcome> {
        // 瀏覽器登入：不帶 cookie 也不帶 API token
        auth::login(&self.for_session(String::new()), credentials).await
    }

    async fn logout(&self, session: &str) -> Result<Vec<String>> {
        auth::logout(&self.for_session(session)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PortalConfig;
    use crate::domain::model::ApiCredentials;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_backend_calls_are_session_scoped() {
        let server = MockServer::start();
        let user = server.mock(|when, then| {
            when.method(POST)
                .path("/api/method/frappe.auth.get_logged_user")
                .header("cookie", "sid=abc123");
            then.status(200)
                .json_body(serde_json::json!({"message": "jane@example.com"}));
        });

        let client = ErpClient::new(
            &PortalConfig::default()
                .with_erp_url(server.base_url())
                .with_credentials(ApiCredentials {
                    api_key: "key".into(),
                    api_secret: "secret".into(),
                }),
        );
        let backend: &dyn PortalBackend = &client;

        assert_eq!(
            backend.logged_user("sid=abc123").await.as_deref(),
            Some("jane@example.com")
        );
        user.assert();
    }

    #[tokio::test]
    async fn test_login_sends_no_token() {
        let server = MockServer::start();
        let with_token = server.mock(|when, then| {
            when.method(POST)
                .path("/api/method/login")
                .header_exists("authorization");
            then.status(500);
        });

        let client = ErpClient::new(
            &PortalConfig::default()
                .with_erp_url(server.base_url())
                .with_credentials(ApiCredentials {
                    api_key: "key".into(),
                    api_secret: "secret".into(),
                }),
        );
        let result = client
            .login(&LoginCredentials {
                usr: "jane@example.com".into(),
                pwd: "hunter2".into(),
            })
            .await;

        // 沒有任何 mock 命中時 httpmock 回 404
        assert!(matches!(
            result,
            Err(crate::utils::error::PortalError::UpstreamStatus { status: 404, .. })
        ));
        with_token.assert_hits(0);
    }
}
