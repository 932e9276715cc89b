use crate::config::PortalConfig;
use crate::core::erp_client::ErpClient;
use crate::core::proxy::ErpProxy;
use crate::core::session_gate::SessionGate;
use crate::domain::ports::PortalBackend;
use std::sync::Arc;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub erp: ErpClient,
    pub proxy: ErpProxy,
    pub backend: Arc<dyn PortalBackend>,
    pub gate: Arc<SessionGate>,
}

impl AppState {
    pub fn new(config: &PortalConfig) -> Self {
        let erp = ErpClient::new(config);
        Self {
            proxy: ErpProxy::new(&erp),
            backend: Arc::new(erp.clone()),
            gate: Arc::new(config.session.clone()),
            erp,
        }
    }

    /// Swaps the page backend, leaving the proxy and health check on the
    /// configured ERP.
    pub fn with_backend(mut self, backend: Arc<dyn PortalBackend>) -> Self {
        self.backend = backend;
        self
    }
}
