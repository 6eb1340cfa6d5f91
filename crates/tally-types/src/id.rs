//! 128-bit identifier helpers.

use crate::error::{TypeError, TypeResult};

/// A random 128-bit identifier, used for client identities.
pub fn random() -> u128 {
    rand::random::<u128>()
}

/// A time-ordered 128-bit identifier backed by UUID v7.
///
/// Ids minted in sequence sort in creation order, which keeps account and
/// transfer ids friendly to the engine's indexes.
pub fn time_ordered() -> u128 {
    uuid::Uuid::now_v7().as_u128()
}

/// Parse an id written as decimal (`42`) or `0x`-prefixed hex (`0x2a`).
pub fn parse(s: &str) -> TypeResult<u128> {
    let trimmed = s.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u128::from_str_radix(hex, 16),
        None => trimmed.parse::<u128>(),
    };
    parsed.map_err(|_| TypeError::InvalidId(s.to_string()))
}

/// Canonical text form used in configuration files: `0x` + 32 hex digits.
pub fn format(id: u128) -> String {
    format!("{id:#034x}")
}

/// Serde adapter writing ids as strings and reading strings or integers.
///
/// TOML integers are 64-bit, so 128-bit ids travel as text in config files.
pub mod serde_text {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(id: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format(*id))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = u128;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a 128-bit id as an integer or a decimal/hex string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
                Ok(v as u128)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
                u128::try_from(v).map_err(|_| E::custom("id must not be negative"))
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> Result<u128, E> {
                Ok(v)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
                super::parse(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}
