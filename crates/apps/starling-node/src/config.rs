//! Node configuration (§10.4): environment variables and `clap`'s `env`
//! feature for the binary surface, a `Default` impl for every nested
//! section reflecting the defaults named in the protocol body.

use std::path::PathBuf;

use clap::Parser;

use crate::error::{NodeError, Result};

/// The platform data directory a node's store and identity keyfile live
/// under when `--data-dir`/`STARLING_DATA_DIR` isn't given. Exposed for the
/// CLI's identity commands, which need the same resolution before a
/// [`NodeConfig`] has necessarily been fully parsed.
pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("STARLING_DATA_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(dirs) = directories::ProjectDirs::from("io", "starling", "starling") {
        return dirs.data_dir().to_path_buf();
    }
    dirs_fallback()
}

fn dirs_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(|home| PathBuf::from(home).join(".starling"))
        .unwrap_or_else(|_| PathBuf::from(".starling"))
}

/// Which [`starling_connector::Connector`] implementation the node talks to.
#[derive(Debug, Clone, Copy, clap::ValueEnum, Default)]
pub enum ConnectorMode {
    /// In-process, zero-latency. Used for single-node demos and tests.
    #[default]
    Direct,
    /// Out-of-process over HTTP, per §6's connector admin API.
    Remote,
}

/// Runtime configuration for one node process (§10.4). Each field is
/// readable from its matching `STARLING_*` environment variable; secrets
/// are loaded from their own env vars and never echoed by `Debug`.
#[derive(Parser, Debug, Clone)]
#[command(name = "starling-node", about = "Run a Starling relay + connector node")]
pub struct NodeConfig {
    /// Directory the event store and identity keyfile live under. Falls
    /// back to the platform data directory (or `$HOME/.starling`) when unset.
    #[arg(long, env = "STARLING_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Address the relay's axum server binds to.
    #[arg(long, env = "STARLING_BIND_ADDR", default_value = "0.0.0.0:7890")]
    pub bind_addr: String,

    /// This node's own dot-separated routing address, e.g. `g.alice`.
    #[arg(long, env = "STARLING_ROUTING_ADDRESS")]
    pub routing_address: String,

    /// Settlement chains this node can negotiate, most-preferred first.
    #[arg(long, env = "STARLING_SUPPORTED_CHAINS", value_delimiter = ',')]
    pub supported_chains: Vec<String>,

    /// Asset code this node prices in, e.g. `USD`.
    #[arg(long, env = "STARLING_ASSET_CODE", default_value = "USD")]
    pub asset_code: String,

    /// Decimal places of the asset scale, e.g. `6` for micro-units.
    #[arg(long, env = "STARLING_ASSET_SCALE", default_value_t = 6)]
    pub asset_scale: u8,

    /// Flat fee (in asset base units) charged for kinds with no override.
    #[arg(long, env = "STARLING_DEFAULT_FLAT_FEE", default_value_t = 0)]
    pub default_flat_fee: u64,

    /// Per-byte rate (in asset base units) charged for kinds with no override.
    #[arg(long, env = "STARLING_DEFAULT_PRICE_PER_BYTE", default_value_t = 1)]
    pub default_price_per_byte: u64,

    /// Whether handshake requests are priced at zero during bootstrap.
    #[arg(long, env = "STARLING_BOOTSTRAP_ZERO_PRICE", default_value_t = true)]
    pub bootstrap_zero_price: bool,

    /// Genesis peers to discover at startup, `routingAddress@transportEndpoint` pairs.
    #[arg(long, env = "STARLING_GENESIS_PEERS", value_delimiter = ',')]
    pub genesis_peers: Vec<String>,

    /// Which connector implementation to run against.
    #[arg(long, env = "STARLING_CONNECTOR_MODE", value_enum, default_value_t = ConnectorMode::Direct)]
    pub connector_mode: ConnectorMode,

    /// Base URL of the out-of-process connector, when `connector_mode=remote`.
    #[arg(long, env = "STARLING_CONNECTOR_URL")]
    pub connector_url: Option<String>,

    /// Whether inbound handshakes are restricted to already-known peers.
    #[arg(long, env = "STARLING_PEER_GATING", default_value_t = false)]
    pub peer_gating_enabled: bool,

    /// Per-peer cooldown, in seconds, before reverse discovery will
    /// re-handshake a target it has already tried.
    #[arg(long, env = "STARLING_HANDSHAKE_COOLDOWN_SECS", default_value_t = 60)]
    pub handshake_cooldown_secs: u64,

    /// How often, in seconds, bootstrap Phase 5 recomputes tracked peers'
    /// trust-derived routing priority.
    #[arg(long, env = "STARLING_TRUST_REFRESH_INTERVAL_SECS", default_value_t = 300)]
    pub trust_refresh_interval_secs: u64,
}

impl std::fmt::Display for ConnectorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

impl NodeConfig {
    /// The resolved data directory: the configured value, or the platform
    /// default when none was given.
    pub fn effective_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    pub fn identity_path(&self) -> PathBuf {
        self.effective_data_dir().join("identity.hex")
    }

    pub fn store_path(&self) -> PathBuf {
        self.effective_data_dir().join("store.sqlite3")
    }

    /// `(routingAddress, transportEndpoint)` pairs parsed out of
    /// `genesis_peers`. Malformed entries are reported, not silently dropped.
    pub fn parsed_genesis_peers(&self) -> Result<Vec<(String, String)>> {
        self.genesis_peers
            .iter()
            .map(|entry| {
                entry
                    .split_once('@')
                    .map(|(addr, endpoint)| (addr.to_string(), endpoint.to_string()))
                    .ok_or_else(|| NodeError::Config(format!("malformed genesis peer entry: {entry}")))
            })
            .collect()
    }
}

#[cfg(test)]
impl NodeConfig {
    /// A minimal config for unit tests that don't care about CLI parsing.
    pub fn default_for_test() -> Self {
        Self {
            data_dir: None,
            bind_addr: "127.0.0.1:0".to_string(),
            routing_address: "g.test".to_string(),
            supported_chains: vec!["evm:base:8453".to_string()],
            asset_code: "USD".to_string(),
            asset_scale: 6,
            default_flat_fee: 0,
            default_price_per_byte: 1,
            bootstrap_zero_price: true,
            genesis_peers: vec![],
            connector_mode: ConnectorMode::Direct,
            connector_url: None,
            peer_gating_enabled: false,
            handshake_cooldown_secs: 60,
            trust_refresh_interval_secs: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        NodeConfig::command().debug_assert();
    }

    #[test]
    fn genesis_peers_parse_address_endpoint_pairs() {
        let config = NodeConfig::parse_from([
            "starling-node",
            "--routing-address",
            "g.alice",
            "--genesis-peers",
            "g.bob@wss://bob.example/ws,g.carol@wss://carol.example/ws",
        ]);
        let parsed = config.parsed_genesis_peers().unwrap();
        assert_eq!(parsed, vec![
            ("g.bob".to_string(), "wss://bob.example/ws".to_string()),
            ("g.carol".to_string(), "wss://carol.example/ws".to_string()),
        ]);
    }

    #[test]
    fn malformed_genesis_peer_is_reported() {
        let config = NodeConfig::parse_from([
            "starling-node",
            "--routing-address",
            "g.alice",
            "--genesis-peers",
            "not-a-pair",
        ]);
        assert!(config.parsed_genesis_peers().is_err());
    }
}
