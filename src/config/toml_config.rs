use crate::core::session_gate::SessionGate;
use crate::utils::error::{PortalError, Result};
use crate::utils::logger::LogFormat;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub server: Option<ServerConfig>,
    pub erp: Option<ErpConfig>,
    pub session: Option<SessionGate>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErpConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PortalError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ERP_API_KEY})，找不到的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| PortalError::ConfigError {
            message: format!("Invalid placeholder pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn listen(&self) -> Option<&str> {
        self.server.as_ref().and_then(|s| s.listen.as_deref())
    }

    pub fn erp_url(&self) -> Option<&str> {
        self.erp.as_ref().and_then(|e| e.url.as_deref())
    }

    pub fn api_key(&self) -> Option<&str> {
        self.erp.as_ref().and_then(|e| e.api_key.as_deref())
    }

    pub fn api_secret(&self) -> Option<&str> {
        self.erp.as_ref().and_then(|e| e.api_secret.as_deref())
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn log_format(&self) -> Option<LogFormat> {
        self.logging.as_ref().and_then(|l| l.format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[server]
listen = "0.0.0.0:8080"

[erp]
url = "https://erp.example.com"
api_key = "key"
api_secret = "secret"

[session]
cookie_name = "sid"
protected_paths = ["/dashboard", "/invoices"]

[logging]
level = "debug"
format = "json"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.listen(), Some("0.0.0.0:8080"));
        assert_eq!(config.erp_url(), Some("https://erp.example.com"));
        assert_eq!(config.api_key(), Some("key"));
        assert_eq!(config.log_format(), Some(LogFormat::Json));

        let session = config.session.unwrap();
        assert_eq!(session.protected_paths, vec!["/dashboard", "/invoices"]);
        // 未指定的欄位使用預設值
        assert_eq!(session.auth_paths, vec!["/login"]);
        assert_eq!(session.guest_value, "Guest");
    }

    #[test]
    fn test_empty_toml_is_valid() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.erp_url().is_none());
        assert!(config.session.is_none());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PORTAL_TEST_ERP_URL", "https://erp.test");

        let toml_content = r#"
[erp]
url = "${PORTAL_TEST_ERP_URL}"
api_key = "${PORTAL_TEST_UNSET_KEY}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.erp_url(), Some("https://erp.test"));
        assert_eq!(config.api_key(), Some("${PORTAL_TEST_UNSET_KEY}"));

        std::env::remove_var("PORTAL_TEST_ERP_URL");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = TomlConfig::from_toml_str("[erp\nurl = ");
        assert!(matches!(result, Err(PortalError::ConfigError { .. })));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[erp]
url = "http://localhost:8000"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.erp_url(), Some("http://localhost:8000"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = TomlConfig::from_file("/nonexistent/portal.toml");
        assert!(matches!(result, Err(PortalError::IoError(_))));
    }
}
