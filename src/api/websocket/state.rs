//! Shared application state

use std::sync::Arc;

use crate::auth::CredentialStore;
use crate::config::ServerConfig;
use crate::relay::{Gateway, Hub};

/// State shared by every HTTP and WebSocket handler
pub struct AppState {
    /// Session gateway over the relay hub
    pub gateway: Gateway,

    /// User database for signup and login
    pub credentials: Arc<CredentialStore>,

    pub config: ServerConfig,
}

impl AppState {
    /// Create state with a fresh, empty relay hub
    pub fn new(config: ServerConfig, credentials: CredentialStore) -> Self {
        Self {
            gateway: Gateway::new(Arc::new(Hub::new())),
            credentials: Arc::new(credentials),
            config,
        }
    }

    pub fn hub(&self) -> &Hub {
        self.gateway.hub()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_state_starts_with_empty_hub() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::open(dir.path().join("db.json"), 4).unwrap();
        let state = AppState::new(ServerConfig::default(), store);

        assert_eq!(state.hub().connection_count(), 0);

        let (tx, _rx) = mpsc::unbounded_channel();
        let id = state.gateway.on_connect(None, tx).unwrap();
        assert!(state.hub().exists(&id));
    }
}
