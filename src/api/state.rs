use std::sync::Arc;

use crate::config::ServerConfig;
use crate::storage::FactStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FactStore>,
    pub server: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn FactStore>) -> Self {
        Self {
            store,
            server: Arc::new(ServerConfig::default()),
        }
    }

    pub fn with_server_config(mut self, server: ServerConfig) -> Self {
        self.server = Arc::new(server);
        self
    }
}
