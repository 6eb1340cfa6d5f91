use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};

/// Host used when a replica is given as a bare port.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// A replica endpoint exactly as the caller wrote it.
///
/// Two configurations are the same only if their address lists are equal
/// entry by entry, so `3001` and `"3001"` are different entries even though
/// they resolve to the same endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplicaAddress {
    Port(u16),
    Text(String),
}

impl ReplicaAddress {
    /// Resolve to a `(host, port)` pair.
    ///
    /// Accepts a bare port (`3001`, `"3001"`), `host:port`, or `[v6]:port`.
    pub fn resolve(&self) -> TypeResult<(String, u16)> {
        match self {
            Self::Port(port) => Self::check_port(*port, &port.to_string())
                .map(|p| (DEFAULT_HOST.to_string(), p)),
            Self::Text(text) => Self::resolve_text(text),
        }
    }

    fn resolve_text(text: &str) -> TypeResult<(String, u16)> {
        let trimmed = text.trim();
        let invalid = |reason: &str| TypeError::InvalidAddress {
            address: text.to_string(),
            reason: reason.to_string(),
        };

        if trimmed.is_empty() {
            return Err(invalid("empty address"));
        }

        let (host, port) = match trimmed.rsplit_once(':') {
            None => (DEFAULT_HOST, trimmed),
            Some((host, port)) => {
                let host = host
                    .strip_prefix('[')
                    .and_then(|h| h.strip_suffix(']'))
                    .unwrap_or(host);
                if host.is_empty() {
                    return Err(invalid("empty host"));
                }
                if host.contains(':') && !trimmed.starts_with('[') {
                    return Err(invalid("IPv6 hosts must be bracketed"));
                }
                (host, port)
            }
        };

        let port = port
            .parse::<u16>()
            .map_err(|_| invalid("port is not a number in 1..=65535"))?;
        Self::check_port(port, text).map(|p| (host.to_string(), p))
    }

    fn check_port(port: u16, raw: &str) -> TypeResult<u16> {
        if port == 0 {
            return Err(TypeError::InvalidAddress {
                address: raw.to_string(),
                reason: "port 0 is not a valid replica port".into(),
            });
        }
        Ok(port)
    }
}

impl From<u16> for ReplicaAddress {
    fn from(port: u16) -> Self {
        Self::Port(port)
    }
}

impl From<&str> for ReplicaAddress {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ReplicaAddress {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl fmt::Display for ReplicaAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Port(port) => write!(f, "{port}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Comma-joined form, as handed to engines that take a single address string.
pub fn join(addresses: &[ReplicaAddress]) -> String {
    addresses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
