use std::fs;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Client configuration, threaded explicitly through every component
/// constructor. There are no ambient globals; tests and embedders build one
/// of these and pass it down.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Indexer endpoint, `host:port`.
    pub server: String,
    pub log_level: String,
    /// Directory holding the queue database.
    pub queue_dir: String,
    #[serde(default = "ClientConfig::default_storage_drivers")]
    pub storage_drivers: Vec<String>,
    #[serde(default = "ClientConfig::default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Confirmations after which a queued operation is considered accepted.
    #[serde(default = "ClientConfig::default_target_confirmations")]
    pub target_confirmations: u32,
    /// Confirmations a preorder needs before its register may be sent.
    #[serde(default = "ClientConfig::default_preorder_confirmations")]
    pub preorder_confirmations: u32,
    /// Confirmations after which any queue entry is considered stale and
    /// pruned.
    #[serde(default = "ClientConfig::default_max_confirmations")]
    pub max_confirmations: u32,
    /// Per-address cap on owned names.
    #[serde(default = "ClientConfig::default_max_names_per_address")]
    pub max_names_per_address: usize,
    /// Satoshis per transaction byte.
    #[serde(default = "ClientConfig::default_fee_per_byte")]
    pub fee_per_byte: u64,
    /// Smallest output value the transaction shape carries, in satoshis.
    #[serde(default = "ClientConfig::default_dust_minimum")]
    pub dust_minimum: u64,
    /// First block of the naming chain; the consensus skip list stops here.
    #[serde(default = "ClientConfig::default_first_block")]
    pub first_block: u64,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: "node.namechain.org:6264".to_string(),
            log_level: "info".to_string(),
            queue_dir: ".namechain".to_string(),
            storage_drivers: Self::default_storage_drivers(),
            poll_interval_secs: Self::default_poll_interval_secs(),
            target_confirmations: Self::default_target_confirmations(),
            preorder_confirmations: Self::default_preorder_confirmations(),
            max_confirmations: Self::default_max_confirmations(),
            max_names_per_address: Self::default_max_names_per_address(),
            fee_per_byte: Self::default_fee_per_byte(),
            dust_minimum: Self::default_dust_minimum(),
            first_block: Self::default_first_block(),
            retry: RetryConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl ClientConfig {
    fn default_storage_drivers() -> Vec<String> {
        vec!["disk".to_string(), "dht".to_string()]
    }

    fn default_poll_interval_secs() -> u64 {
        600
    }

    fn default_target_confirmations() -> u32 {
        6
    }

    fn default_preorder_confirmations() -> u32 {
        6
    }

    fn default_max_confirmations() -> u32 {
        130
    }

    fn default_max_names_per_address() -> usize {
        25
    }

    fn default_fee_per_byte() -> u64 {
        100
    }

    fn default_dust_minimum() -> u64 {
        5500
    }

    fn default_first_block() -> u64 {
        373601
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    #[serde(default = "RetryConfig::default_attempts")]
    pub attempts: u32,
    #[serde(default = "RetryConfig::default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { attempts: Self::default_attempts(), backoff_ms: Self::default_backoff_ms() }
    }
}

impl RetryConfig {
    fn default_attempts() -> u32 {
        3
    }

    fn default_backoff_ms() -> u64 {
        1000
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    #[serde(default = "TelemetryConfig::default_format")]
    pub format: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { format: Self::default_format(), json: false }
    }
}

impl TelemetryConfig {
    fn default_format() -> String {
        "pretty".to_string()
    }
}

pub fn load_config(path: Option<&str>) -> Result<ClientConfig> {
    match path {
        None => Ok(ClientConfig::default()),
        Some(p) => {
            let raw = fs::read_to_string(Path::new(p))?;
            let mut cfg: ClientConfig = serde_json::from_str(&raw)
                .map_err(|e| anyhow!("invalid config json: {e}"))?;
            if cfg.server.trim().is_empty() {
                cfg.server = ClientConfig::default().server;
            }
            if cfg.log_level.trim().is_empty() {
                cfg.log_level = ClientConfig::default().log_level;
            }
            if cfg.queue_dir.trim().is_empty() {
                cfg.queue_dir = ClientConfig::default().queue_dir;
            }
            Ok(cfg)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.poll_interval_secs, 600);
        assert_eq!(cfg.target_confirmations, 6);
        assert_eq!(cfg.max_names_per_address, 25);
        assert_eq!(cfg.max_confirmations, 130);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let raw = r#"{"server": "localhost:16264", "log_level": "debug", "queue_dir": "/tmp/nc"}"#;
        let cfg: ClientConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.server, "localhost:16264");
        assert_eq!(cfg.preorder_confirmations, 6);
        assert_eq!(cfg.retry.attempts, 3);
    }

    #[test]
    fn load_config_without_path_is_default() {
        let cfg = load_config(None).unwrap();
        assert_eq!(cfg.first_block, 373601);
    }
}
