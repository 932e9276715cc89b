use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// 穩定的錯誤代碼，客戶端依此判斷，不依賴訊息文字
pub mod error_code {
    pub const CONFIG_MISSING: &str = "CONFIG_MISSING";
    pub const CONFIG_INVALID: &str = "CONFIG_INVALID";
    pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";
    pub const UPSTREAM_UNREACHABLE: &str = "UPSTREAM_UNREACHABLE";
    pub const UPSTREAM_INVALID_RESPONSE: &str = "UPSTREAM_INVALID_RESPONSE";
    pub const REQUEST_INVALID: &str = "REQUEST_INVALID";
    pub const INTERNAL: &str = "INTERNAL";
}

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("ERP responded with status {status} for {url}")]
    UpstreamStatus {
        status: u16,
        body: String,
        url: String,
    },

    #[error("No response received from {url}: {message}")]
    UpstreamUnreachable { url: String, message: String },

    #[error("Failed to build ERP request: {message}")]
    RequestBuildError { message: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Upstream,
    Network,
    Request,
    Data,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PortalError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PortalError::MissingConfigError { .. }
            | PortalError::InvalidConfigValueError { .. }
            | PortalError::ConfigError { .. } => ErrorCategory::Configuration,
            PortalError::UpstreamStatus { .. } => ErrorCategory::Upstream,
            PortalError::UpstreamUnreachable { .. } => ErrorCategory::Network,
            PortalError::RequestBuildError { .. } => ErrorCategory::Request,
            PortalError::SerializationError(_) => ErrorCategory::Data,
            PortalError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PortalError::UpstreamStatus { status, .. } if *status < 500 => ErrorSeverity::Low,
            PortalError::UpstreamStatus { .. } => ErrorSeverity::Medium,
            PortalError::UpstreamUnreachable { .. } => ErrorSeverity::Medium,
            PortalError::RequestBuildError { .. } | PortalError::SerializationError(_) => {
                ErrorSeverity::High
            }
            PortalError::MissingConfigError { .. }
            | PortalError::InvalidConfigValueError { .. }
            | PortalError::ConfigError { .. }
            | PortalError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    /// 給使用者看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            PortalError::MissingConfigError { field } => {
                format!("Required setting '{}' is not configured", field)
            }
            PortalError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            PortalError::ConfigError { message } => message.clone(),
            PortalError::UpstreamStatus { status, .. } => match *status {
                401 => "You are not signed in to the ERP".to_string(),
                403 => "You do not have permission to access this ERP resource".to_string(),
                404 => "The requested ERP record does not exist".to_string(),
                _ => format!("The ERP returned an error (status {})", status),
            },
            PortalError::UpstreamUnreachable { .. } => {
                "The ERP server could not be reached".to_string()
            }
            PortalError::RequestBuildError { .. } => {
                "The request to the ERP could not be built".to_string()
            }
            PortalError::SerializationError(_) => {
                "The ERP returned data in an unexpected format".to_string()
            }
            PortalError::IoError(e) => format!("I/O failure: {}", e),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check ERP_URL, ERP_API_KEY, ERP_API_SECRET and the TOML config file"
            }
            ErrorCategory::Upstream => "Check the ERP credentials and the requested record",
            ErrorCategory::Network => "Ensure the ERP server is running and reachable",
            ErrorCategory::Request => "Check the request path and parameters",
            ErrorCategory::Data => "Check that the ERP version matches the portal",
            ErrorCategory::System => "Check file paths and permissions",
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            PortalError::MissingConfigError { .. } => error_code::CONFIG_MISSING,
            PortalError::InvalidConfigValueError { .. } | PortalError::ConfigError { .. } => {
                error_code::CONFIG_INVALID
            }
            PortalError::UpstreamStatus { .. } => error_code::UPSTREAM_ERROR,
            PortalError::UpstreamUnreachable { .. } => error_code::UPSTREAM_UNREACHABLE,
            PortalError::SerializationError(_) => error_code::UPSTREAM_INVALID_RESPONSE,
            PortalError::RequestBuildError { .. } => error_code::REQUEST_INVALID,
            PortalError::IoError(_) => error_code::INTERNAL,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PortalError::UpstreamStatus { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            PortalError::UpstreamUnreachable { .. } | PortalError::SerializationError(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // 上游錯誤原樣回傳
        if let PortalError::UpstreamStatus { body, .. } = self {
            return (status, [(header::CONTENT_TYPE, "application/json")], body).into_response();
        }
        let body = serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, PortalError>;
