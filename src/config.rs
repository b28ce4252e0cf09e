use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{CatalogError, Result};

/// Name of the configuration file looked up in the user's config directory.
pub const CONFIG_FILENAME: &str = "config.json";

/// Directory (under the platform config dir) that holds `config.json`.
pub const APP_DIR: &str = "filelist";

/// Default listen port for the HTTP JSON-RPC front-end.
pub const DEFAULT_HTTP_PORT: u16 = 8080;

/// Default listen port for the plain TCP front-end.
pub const DEFAULT_TCP_PORT: u16 = 10000;

/// Upper bound for the single read a TCP connection gets.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 4096;

/// Listener settings shared by the network front-ends.
///
/// Every field is optional in the file; missing ones take the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port for `filelist http`.
    pub http_port: u16,
    /// Port for `filelist-tcp`.
    pub tcp_port: u16,
    /// Maximum bytes read from a TCP request.
    pub max_request_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            http_port: DEFAULT_HTTP_PORT,
            tcp_port: DEFAULT_TCP_PORT,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
        }
    }
}

impl ServerConfig {
    /// `host:port` string for the HTTP listener.
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }

    /// `host:port` string for the TCP listener.
    pub fn tcp_addr(&self) -> String {
        format!("{}:{}", self.host, self.tcp_port)
    }
}

/// Returns `<config_dir>/filelist/config.json`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILENAME))
}

/// Loads the configuration from `path`.
///
/// A missing file is not an error; the defaults are returned instead.
pub fn load_config(path: &Path) -> Result<ServerConfig> {
    if !path.exists() {
        return Ok(ServerConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(|e| CatalogError::Config {
        message: format!("failed to read config file '{}': {}", path.display(), e),
    })?;

    let config: ServerConfig = serde_json::from_str(&contents).map_err(|e| CatalogError::Config {
        message: format!("failed to parse config file '{}': {}", path.display(), e),
    })?;

    if config.max_request_bytes == 0 {
        return Err(CatalogError::Config {
            message: format!(
                "invalid config file '{}': max_request_bytes must be at least 1",
                path.display()
            ),
        });
    }

    Ok(config)
}

/// Loads from an explicit path, or from [`default_config_path`] when none is given.
pub fn resolve_config(explicit: Option<&Path>) -> Result<ServerConfig> {
    match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(CatalogError::Config {
                    message: format!("config file '{}' does not exist", path.display()),
                });
            }
            load_config(path)
        }
        None => match default_config_path() {
            Some(path) => load_config(&path),
            None => Ok(ServerConfig::default()),
        },
    }
}
