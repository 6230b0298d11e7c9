//! Server implementation

use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::server::{Server, ServerHandle};
use thumbtrack_rpc::ThumbtrackApiServer;
use thumbtrack_search::{IndexHealth, IndexStore};
use thumbtrack_store::MemoryStore;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::handler::RpcHandler;

/// The Thumbtrack server
pub struct ThumbtrackServer {
    config: ServerConfig,
    store: Arc<MemoryStore>,
    handler: RpcHandler,
    handle: Option<ServerHandle>,
    local_addr: Option<SocketAddr>,
}

impl ThumbtrackServer {
    /// Load the store, probe the search index and wire the services
    ///
    /// An unusable index only degrades search; a broken snapshot is an error.
    pub async fn open(config: ServerConfig) -> Result<Self> {
        let store = match &config.data_file {
            Some(path) => MemoryStore::open(path).await?,
            None => MemoryStore::new(),
        };
        let store = Arc::new(store);

        let health = Arc::new(IndexHealth::new());
        let index = IndexStore::initialize(config.index_location(), health).await;
        if !index.is_available() {
            warn!("Serving search from the store; results are unranked");
        }

        let handler = RpcHandler::new(store.clone(), index, config.feed.clone());
        Ok(Self {
            config,
            store,
            handler,
            handle: None,
            local_addr: None,
        })
    }

    /// The backing store
    pub fn store(&self) -> Arc<MemoryStore> {
        Arc::clone(&self.store)
    }

    pub fn handler(&self) -> &RpcHandler {
        &self.handler
    }

    /// Start the server
    pub async fn start(&mut self) -> Result<()> {
        let server = Server::builder()
            .build(&self.config.addr)
            .await
            .map_err(|e| ServerError::Server(e.to_string()))?;
        let local_addr = server.local_addr()?;

        let methods = self.handler.clone().into_rpc();

        info!("Starting Thumbtrack server on {}", local_addr);
        let handle = server.start(methods);
        self.handle = Some(handle);
        self.local_addr = Some(local_addr);

        Ok(())
    }

    /// Stop the server
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(handle) = self.handle.take() {
            handle.stop().map_err(|e| ServerError::Server(e.to_string()))?;
            info!("Thumbtrack server stopped");
        }
        Ok(())
    }

    /// Wait for the server to finish
    pub async fn wait(&self) {
        if let Some(ref handle) = self.handle {
            handle.clone().stopped().await;
        }
    }

    /// The bound address once started, the configured one before
    pub fn addr(&self) -> SocketAddr {
        self.local_addr.unwrap_or(self.config.addr)
    }
}

/// Start a server and run it until shutdown
pub async fn run_server(config: ServerConfig) -> Result<()> {
    let mut server = ThumbtrackServer::open(config).await?;
    server.start().await?;

    // Wait for Ctrl+C
    tokio::signal::ctrl_c().await?;

    info!("Shutting down...");
    server.stop().await?;

    server.store().save().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use thumbtrack_core::User;
    use thumbtrack_store::PinStore;

    fn local_config() -> ServerConfig {
        ServerConfig {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_start_binds_and_stops() {
        let mut server = ThumbtrackServer::open(local_config()).await.unwrap();
        server.start().await.unwrap();
        assert_ne!(server.addr().port(), 0);
        assert!(server.handler().index().is_available());
        server.stop().await.unwrap();
        server.wait().await;
    }

    #[tokio::test]
    async fn test_unusable_index_dir_degrades_instead_of_failing() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("index");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let config = ServerConfig {
            index_dir: Some(blocker),
            ..local_config()
        };
        let server = ThumbtrackServer::open(config).await.unwrap();
        assert!(!server.handler().index().is_available());
    }

    #[tokio::test]
    async fn test_snapshot_is_loaded_from_data_file() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("thumbtrack.json");
        let user_id = {
            let store = MemoryStore::open(&data).await.unwrap();
            let id = store.add_user(User::new("ada")).await;
            store.save().await.unwrap();
            id
        };

        let config = ServerConfig {
            data_file: Some(data),
            ..local_config()
        };
        let server = ThumbtrackServer::open(config).await.unwrap();
        let user = server.store().user(user_id).await.unwrap();
        assert_eq!(user.map(|u| u.username), Some("ada".to_string()));
    }
}
