//! Server configuration

use std::net::SocketAddr;
use std::path::PathBuf;

use thumbtrack_feed::FeedConfig;
use thumbtrack_search::IndexLocation;

use crate::error::{Result, ServerError};

pub const ENV_ADDR: &str = "THUMBTRACK_ADDR";
pub const ENV_INDEX_DIR: &str = "THUMBTRACK_INDEX_DIR";
pub const ENV_DATA: &str = "THUMBTRACK_DATA";

/// Configuration for the Thumbtrack server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub addr: SocketAddr,
    /// Root directory of the search index; in memory when unset
    pub index_dir: Option<PathBuf>,
    /// JSON snapshot backing the store; nothing persisted when unset
    pub data_file: Option<PathBuf>,
    pub feed: FeedConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 9877)),
            index_dir: None,
            data_file: None,
            feed: FeedConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `THUMBTRACK_ADDR`, `THUMBTRACK_INDEX_DIR` and `THUMBTRACK_DATA`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like `from_env`, reading variables through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(addr) = lookup(ENV_ADDR) {
            config.addr = addr
                .parse()
                .map_err(|e| ServerError::Config(format!("{} '{}': {}", ENV_ADDR, addr, e)))?;
        }
        config.index_dir = lookup(ENV_INDEX_DIR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        config.data_file = lookup(ENV_DATA).filter(|v| !v.is_empty()).map(PathBuf::from);
        Ok(config)
    }

    pub fn index_location(&self) -> IndexLocation {
        match &self.index_dir {
            Some(dir) => IndexLocation::Directory(dir.clone()),
            None => IndexLocation::InMemory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.addr.port(), 9877);
        assert_eq!(config.index_location(), IndexLocation::InMemory);
        assert!(config.data_file.is_none());
        assert_eq!(config.feed.feed_size, 40);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            (ENV_ADDR, "0.0.0.0:8080"),
            (ENV_INDEX_DIR, "/var/lib/thumbtrack"),
            (ENV_DATA, "/var/lib/thumbtrack/data.json"),
        ]))
        .unwrap();
        assert_eq!(config.addr.port(), 8080);
        assert_eq!(
            config.index_location(),
            IndexLocation::Directory(PathBuf::from("/var/lib/thumbtrack"))
        );
        assert_eq!(
            config.data_file,
            Some(PathBuf::from("/var/lib/thumbtrack/data.json"))
        );
    }

    #[test]
    fn test_invalid_address_is_rejected() {
        let result = ServerConfig::from_lookup(lookup(&[(ENV_ADDR, "not an address")]));
        assert!(matches!(result, Err(ServerError::Config(_))));
    }
}
