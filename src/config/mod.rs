pub mod toml_config;

use crate::core::session_gate::SessionGate;
use crate::domain::model::ApiCredentials;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::logger::LogFormat;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use std::path::PathBuf;
use toml_config::TomlConfig;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, Default, Parser)]
#[command(name = "erp-portal")]
#[command(about = "Customer portal in front of a Frappe ERP")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(long, env = "PORTAL_LISTEN", help = "Listen address [default: 127.0.0.1:3000]")]
    pub listen: Option<String>,

    #[arg(long, env = "ERP_URL", help = "ERP base URL")]
    pub erp_url: Option<String>,

    #[arg(long, env = "ERP_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "ERP_API_SECRET", hide_env_values = true)]
    pub api_secret: Option<String>,

    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

/// 合併後的執行期配置：CLI/環境變數 > TOML > 預設值
#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub listen: String,
    pub erp_url: Option<String>,
    pub credentials: Option<ApiCredentials>,
    pub session: SessionGate,
    pub log_level: Option<String>,
    pub log_format: LogFormat,
    pub verbose: bool,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            erp_url: None,
            credentials: None,
            session: SessionGate::default(),
            log_level: None,
            log_format: LogFormat::default(),
            verbose: false,
        }
    }
}

impl PortalConfig {
    pub fn load(cli: &CliConfig) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => Some(TomlConfig::from_file(path)?),
            None => None,
        };
        Ok(Self::merge(file.unwrap_or_default(), cli))
    }

    pub fn merge(file: TomlConfig, cli: &CliConfig) -> Self {
        let listen = setting(cli.listen.as_deref(), file.listen())
            .unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let erp_url = setting(cli.erp_url.as_deref(), file.erp_url());
        let credentials = ApiCredentials::from_parts(
            setting(cli.api_key.as_deref(), file.api_key()),
            setting(cli.api_secret.as_deref(), file.api_secret()),
        );

        Self {
            listen,
            erp_url,
            credentials,
            log_level: file.log_level().map(str::to_string),
            log_format: cli
                .log_format
                .or_else(|| file.log_format())
                .unwrap_or_default(),
            session: file.session.unwrap_or_default(),
            verbose: cli.verbose,
        }
    }

    pub fn with_erp_url(mut self, url: impl Into<String>) -> Self {
        self.erp_url = Some(url.into());
        self
    }

    pub fn with_credentials(mut self, credentials: ApiCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }
}

/// Empty strings and unresolved `${VAR}` placeholders count as unset.
fn setting(primary: Option<&str>, fallback: Option<&str>) -> Option<String> {
    let usable = |v: &&str| {
        let v = v.trim();
        !v.is_empty() && !(v.starts_with("${") && v.ends_with('}'))
    };
    primary
        .filter(usable)
        .or_else(|| fallback.filter(usable))
        .map(|v| v.trim().to_string())
}

impl ConfigProvider for PortalConfig {
    fn erp_url(&self) -> Option<&str> {
        self.erp_url.as_deref()
    }

    fn api_credentials(&self) -> Option<&ApiCredentials> {
        self.credentials.as_ref()
    }
}

impl Validate for PortalConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_listen_address("server.listen", &self.listen)?;
        if let Some(url) = &self.erp_url {
            validation::validate_url("erp.url", url)?;
        }
        self.session.validate()
    }
}
