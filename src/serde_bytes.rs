//! Serde helpers for byte payloads
//!
//! Calldata and return data travel as `0x`-prefixed hex strings, the way
//! JSON-RPC and block explorers print them.

use crate::utils::crypto::to_hex_prefixed;
use serde::{Deserialize, Deserializer, Serializer};

/// Serialize/deserialize `Vec<u8>` as a 0x-prefixed hex string
pub mod hex_vec {
    use super::*;

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&to_hex_prefixed(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let cleaned = s.trim_start_matches("0x").trim_start_matches("0X");
        hex::decode(cleaned).map_err(serde::de::Error::custom)
    }
}
