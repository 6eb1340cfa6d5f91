use serde::{Deserialize, Serialize};

/// What a transfer timeout of zero means.
///
/// The error taxonomy alone does not settle this, so it is a deployment
/// choice that must match the engine the client talks to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroTimeout {
    /// A pending transfer with `timeout == 0` waits for its commit forever.
    #[default]
    NeverExpires,
    /// A pending transfer with `timeout == 0` expires at the next sweep.
    ExpiresImmediately,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub zero_timeout: ZeroTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_never_expires() {
        assert_eq!(LedgerConfig::default().zero_timeout, ZeroTimeout::NeverExpires);
    }
}
