pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use app::{routes::build_router, state::AppState};
pub use config::{CliConfig, PortalConfig};
pub use core::{erp_client::ErpClient, proxy::ErpProxy};
pub use utils::error::{PortalError, Result};
