use clap::Parser;
use erp_portal::core::erp_client::MISSING_URL_MESSAGE;
use erp_portal::utils::{logger, validation::Validate};
use erp_portal::{build_router, AppState, CliConfig, PortalConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match PortalConfig::load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    // 初始化日誌
    logger::init_logger(config.verbose, config.log_level.as_deref(), config.log_format);

    tracing::info!("Starting erp-portal {}", env!("CARGO_PKG_VERSION"));
    if config.verbose {
        tracing::debug!("Portal config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    match config.erp_url.as_deref() {
        Some(url) => tracing::info!("🔗 ERP backend: {}", url),
        None => tracing::warn!("⚠️ {}", MISSING_URL_MESSAGE),
    }
    if config.credentials.is_some() {
        tracing::info!("🔑 Using API key authentication for proxied calls");
    }

    let app = build_router(AppState::new(&config));
    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    tracing::info!("🌐 Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
