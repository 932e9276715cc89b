use crate::utils::error::{PortalError, Result};
use std::net::SocketAddr;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(PortalError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(PortalError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(PortalError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_listen_address(field_name: &str, addr: &str) -> Result<()> {
    addr.parse::<SocketAddr>()
        .map(|_| ())
        .map_err(|e| PortalError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: addr.to_string(),
            reason: format!("Invalid socket address: {}", e),
        })
}

/// 路由路徑必須以 `/` 開頭
pub fn validate_route_path(field_name: &str, path: &str) -> Result<()> {
    if !path.starts_with('/') {
        return Err(PortalError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path must start with '/'".to_string(),
        });
    }
    Ok(())
}

pub fn validate_route_paths(field_name: &str, paths: &[String]) -> Result<()> {
    for path in paths {
        validate_route_path(field_name, path)?;
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PortalError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("erp.url", "https://erp.example.com").is_ok());
        assert!(validate_url("erp.url", "http://localhost:8000").is_ok());
        assert!(validate_url("erp.url", "").is_err());
        assert!(validate_url("erp.url", "invalid-url").is_err());
        assert!(validate_url("erp.url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_listen_address() {
        assert!(validate_listen_address("server.listen", "127.0.0.1:3000").is_ok());
        assert!(validate_listen_address("server.listen", "0.0.0.0:80").is_ok());
        assert!(validate_listen_address("server.listen", "localhost").is_err());
    }

    #[test]
    fn test_validate_route_paths() {
        let paths = vec!["/dashboard".to_string(), "/account".to_string()];
        assert!(validate_route_paths("session.protected_paths", &paths).is_ok());

        let invalid = vec!["dashboard".to_string()];
        assert!(validate_route_paths("session.protected_paths", &invalid).is_err());
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("session.cookie_name", "sid").is_ok());
        assert!(validate_non_empty_string("session.cookie_name", "  ").is_err());
    }
}
