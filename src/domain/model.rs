use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// ERP 專案記錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub project_name: String,
    #[serde(default)]
    pub project_code: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub expected_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub expected_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub percent_complete: Option<f64>,
}

impl Project {
    pub const FIELDS: [&'static str; 7] = [
        "name",
        "project_name",
        "project_code",
        "status",
        "expected_start_date",
        "expected_end_date",
        "percent_complete",
    ];

    /// Completion clamped to 0-100.
    pub fn progress(&self) -> Option<f64> {
        self.percent_complete.map(|p| p.clamp(0.0, 100.0))
    }
}

/// ERP 客戶記錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub customer_name: String,
    #[serde(default)]
    pub customer_type: Option<String>,
    #[serde(default)]
    pub territory: Option<String>,
    #[serde(default)]
    pub customer_group: Option<String>,
}

impl Customer {
    pub const FIELDS: [&'static str; 5] = [
        "name",
        "customer_name",
        "customer_type",
        "territory",
        "customer_group",
    ];
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub usr: String,
    pub pwd: String,
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("usr", &self.usr)
            .field("pwd", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    #[serde(default)]
    pub home_page: String,
    #[serde(default)]
    pub full_name: String,
}

/// `GET /api/resource/<doctype>` 的回應
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// `GET /api/resource/<doctype>/<name>` 的回應
#[derive(Debug, Clone, Deserialize)]
pub struct DocResponse<T> {
    pub data: T,
}

/// `/api/method/<method>` 的回應
#[derive(Debug, Clone, Deserialize)]
pub struct MethodResponse<T> {
    pub message: T,
}

/// Result of the ERP connectivity probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

/// Query options for list reads. `fields` and `filters` are JSON-encoded
/// into the query string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    pub fields: Option<Vec<String>>,
    pub filters: Option<Vec<serde_json::Value>>,
    pub limit_page_length: Option<u32>,
    pub limit_start: Option<u32>,
    pub order_by: Option<String>,
}

impl ListParams {
    pub fn with_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: Some(fields.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(fields) = &self.fields {
            query.push((
                "fields".to_string(),
                serde_json::Value::from(fields.clone()).to_string(),
            ));
        }
        if let Some(filters) = &self.filters {
            query.push((
                "filters".to_string(),
                serde_json::Value::from(filters.clone()).to_string(),
            ));
        }
        if let Some(limit) = self.limit_page_length {
            query.push(("limit_page_length".to_string(), limit.to_string()));
        }
        if let Some(start) = self.limit_start {
            query.push(("limit_start".to_string(), start.to_string()));
        }
        if let Some(order_by) = &self.order_by {
            query.push(("order_by".to_string(), order_by.clone()));
        }
        query
    }
}

/// Static API key pair for server-originated calls.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
}

impl ApiCredentials {
    /// Both halves must be non-empty.
    pub fn from_parts(api_key: Option<String>, api_secret: Option<String>) -> Option<Self> {
        match (api_key, api_secret) {
            (Some(api_key), Some(api_secret)) if !api_key.is_empty() && !api_secret.is_empty() => {
                Some(Self {
                    api_key,
                    api_secret,
                })
            }
            _ => None,
        }
    }

    pub fn authorization_header(&self) -> String {
        format!("token {}:{}", self.api_key, self.api_secret)
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}
