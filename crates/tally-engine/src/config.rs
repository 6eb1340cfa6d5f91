use serde::{Deserialize, Serialize};
use tally_ledger::{LedgerConfig, ZeroTimeout};
use tally_types::id;

/// Settings for the loopback engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// The only cluster id this engine accepts sessions for.
    #[serde(with = "id::serde_text", default)]
    pub cluster_id: u128,
    #[serde(default)]
    pub zero_timeout: ZeroTimeout,
}

impl EngineConfig {
    pub fn new(cluster_id: u128) -> Self {
        Self {
            cluster_id,
            ..Self::default()
        }
    }

    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            zero_timeout: self.zero_timeout,
        }
    }
}
