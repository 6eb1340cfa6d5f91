use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tally_types::{id, ReplicaAddress};

use crate::error::{ClientError, ClientResult};

pub const ENV_CLUSTER_ID: &str = "TALLY_CLUSTER_ID";
pub const ENV_CLIENT_ID: &str = "TALLY_CLIENT_ID";
pub const ENV_ADDRESSES: &str = "TALLY_ADDRESSES";

pub const DEFAULT_TICK_INTERVAL_MS: u64 = 50;
pub const DEFAULT_REPLICA_PORT: u16 = 3001;

/// Session configuration.
///
/// Ids are written as decimal or `0x`-prefixed hex strings; TOML integers are
/// also accepted when they fit in 64 bits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Identifies this session to the cluster. Random unless configured.
    #[serde(with = "id::serde_text", default = "id::random")]
    pub client_id: u128,
    #[serde(with = "id::serde_text", default)]
    pub cluster_id: u128,
    #[serde(default = "default_addresses")]
    pub replica_addresses: Vec<ReplicaAddress>,
    /// How often the session drives the engine forward.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

fn default_addresses() -> Vec<ReplicaAddress> {
    vec![ReplicaAddress::Port(DEFAULT_REPLICA_PORT)]
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_id: id::random(),
            cluster_id: 0,
            replica_addresses: default_addresses(),
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl ClientConfig {
    pub fn new(cluster_id: u128, replica_addresses: Vec<ReplicaAddress>) -> Self {
        Self {
            cluster_id,
            replica_addresses,
            ..Self::default()
        }
    }

    pub fn from_toml_str(text: &str) -> ClientResult<Self> {
        toml::from_str(text).map_err(|e| ClientError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> ClientResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> ClientResult<String> {
        toml::to_string_pretty(self).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// Apply `TALLY_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> ClientResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `TALLY_*` overrides from `lookup`. `TALLY_ADDRESSES` is a
    /// comma-separated list; entries that are plain numbers become ports.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ClientResult<Self> {
        if let Some(value) = lookup(ENV_CLUSTER_ID) {
            self.cluster_id = parse_id(ENV_CLUSTER_ID, &value)?;
        }
        if let Some(value) = lookup(ENV_CLIENT_ID) {
            self.client_id = parse_id(ENV_CLIENT_ID, &value)?;
        }
        if let Some(value) = lookup(ENV_ADDRESSES) {
            self.replica_addresses = parse_addresses(&value);
        }
        Ok(self)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    /// Whether `other` would open the very same session: same client id,
    /// same cluster id and the same replica list in the same order.
    pub fn same_identity(&self, other: &ClientConfig) -> bool {
        self.client_id == other.client_id
            && self.cluster_id == other.cluster_id
            && self.replica_addresses == other.replica_addresses
    }

    pub fn validate(&self) -> ClientResult<()> {
        if self.replica_addresses.is_empty() {
            return Err(ClientError::Config("replica_addresses is empty".into()));
        }
        for address in &self.replica_addresses {
            address
                .resolve()
                .map_err(|e| ClientError::Config(e.to_string()))?;
        }
        Ok(())
    }
}

fn parse_id(key: &str, value: &str) -> ClientResult<u128> {
    id::parse(value).map_err(|e| ClientError::Config(format!("{key}: {e}")))
}

fn parse_addresses(value: &str) -> Vec<ReplicaAddress> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.parse::<u16>() {
            Ok(port) => ReplicaAddress::Port(port),
            Err(_) => ReplicaAddress::from(entry),
        })
        .collect()
}
