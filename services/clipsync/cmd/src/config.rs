//! Configuration handling for the clipsync node.
//!
//! Values come from an optional YAML file, then `CLIPSYNC_*` environment
//! variables, then command line flags (applied by the caller).

use anyhow::Result;
use clip_session::ClientConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Relay used when nothing else is configured
pub const DEFAULT_URL: &str = "ws://127.0.0.1:5002/clip";

/// clipsync node configuration
#[derive(Debug, Clone)]
pub struct ClipConfig {
    /// Relay URL (ws:// or wss://)
    pub url: String,
    /// Shared key, 16 hex characters
    pub key: String,
    /// Id stamped on outbound snapshots
    pub node_id: String,
    /// Keepalive interval
    pub ping_interval: Duration,
    /// Upper bound on one dial attempt
    pub dial_timeout: Duration,
    /// Upper bound on one write
    pub write_timeout: Duration,
}

impl Default for ClipConfig {
    fn default() -> Self {
        let client = ClientConfig::default();
        Self {
            url: DEFAULT_URL.to_string(),
            key: String::new(),
            node_id: random_node_id(),
            ping_interval: client.ping_interval,
            dial_timeout: client.dial_timeout,
            write_timeout: client.write_timeout,
        }
    }
}

/// On-disk layout; every key is optional
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    url: Option<String>,
    key: Option<String>,
    node_id: Option<String>,
    ping_interval: Option<String>,
    dial_timeout: Option<String>,
    write_timeout: Option<String>,
}

/// First 8 characters of a random v4 uuid
pub fn random_node_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

impl ClipConfig {
    /// Load configuration from `config_path` (if given) and the environment
    pub fn load<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path {
            let path = path.as_ref();
            match std::fs::read_to_string(path) {
                Ok(content) => match serde_yaml::from_str::<FileConfig>(&content) {
                    Ok(file) => {
                        config.apply_file_config(file);
                        info!("Loaded configuration from {:?}", path);
                    }
                    Err(e) => warn!("Failed to parse config file {:?} ({}), using defaults", path, e),
                },
                Err(_) => warn!("Config file {:?} not found, using defaults", path),
            }
        }

        config.apply_environment_overrides();
        Ok(config)
    }

    fn apply_file_config(&mut self, file: FileConfig) {
        if let Some(url) = file.url {
            self.url = url;
        }
        if let Some(key) = file.key {
            self.key = key;
        }
        if let Some(node_id) = file.node_id {
            self.node_id = node_id;
        }
        set_duration(&mut self.ping_interval, "ping_interval", file.ping_interval);
        set_duration(&mut self.dial_timeout, "dial_timeout", file.dial_timeout);
        set_duration(&mut self.write_timeout, "write_timeout", file.write_timeout);
    }

    fn apply_environment_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("CLIPSYNC_URL") {
            info!("Relay URL overridden by environment: {}", url);
            self.url = url;
        }
        if let Some(key) = lookup("CLIPSYNC_KEY") {
            info!("Key overridden by environment");
            self.key = key;
        }
        if let Some(node_id) = lookup("CLIPSYNC_NODE_ID") {
            info!("Node ID overridden by environment: {}", node_id);
            self.node_id = node_id;
        }
    }

    /// Client settings derived from this configuration
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            ping_interval: self.ping_interval,
            dial_timeout: self.dial_timeout,
            write_timeout: self.write_timeout,
            ..ClientConfig::default()
        }
    }
}

fn set_duration(target: &mut Duration, name: &str, value: Option<String>) {
    let Some(value) = value else {
        return;
    };
    match humantime::parse_duration(&value) {
        Ok(d) => *target = d,
        Err(e) => warn!("Ignoring {} {:?}: {}", name, value, e),
    }
}
