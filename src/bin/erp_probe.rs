//! One-shot connectivity check against the configured ERP.
//!
//! Prints the probe result as JSON and exits non-zero when the ERP cannot be
//! reached.

use clap::Parser;
use erp_portal::utils::logger;
use erp_portal::{CliConfig, ErpClient, PortalConfig};

#[derive(Debug, Parser)]
#[command(name = "erp-probe")]
#[command(about = "Check that the configured ERP answers")]
struct Args {
    #[command(flatten)]
    portal: CliConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.portal.verbose);

    let config = match PortalConfig::load(&args.portal) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    tracing::info!("🔍 Probing ERP connection");
    let status = ErpClient::new(&config).test_connection().await;
    println!("{}", serde_json::to_string_pretty(&status)?);

    if status.success {
        tracing::info!("✅ {}", status.message);
        Ok(())
    } else {
        tracing::error!("❌ {}", status.message);
        std::process::exit(1);
    }
}
