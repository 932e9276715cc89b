use crate::domain::model::{ApiCredentials, Customer, LoginCredentials, LoginResponse, Project};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait ConfigProvider: Send + Sync {
    /// ERP 基底網址；未設定時為 `None`
    fn erp_url(&self) -> Option<&str>;
    fn api_credentials(&self) -> Option<&ApiCredentials>;
}

/// A successful login: the ERP's answer plus the cookies it set.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub response: LoginResponse,
    pub set_cookies: Vec<String>,
}

/// ERP operations the web layer depends on, scoped to one caller's session
/// cookie.
#[async_trait]
pub trait PortalBackend: Send + Sync {
    async fn logged_user(&self, session: &str) -> Option<String>;
    async fn projects(&self, session: &str) -> Result<Vec<Project>>;
    async fn project(&self, session: &str, name: &str) -> Result<Project>;
    async fn customer_info(&self, session: &str) -> Option<Customer>;
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginOutcome>;
    /// Returns the cookies the ERP set while ending the session.
    async fn logout(&self, session: &str) -> Result<Vec<String>>;
}
