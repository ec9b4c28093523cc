//! Hashing and encoding helpers
//!
//! Keccak256, EIP-55 checksums and hex parsing shared by the ABI layer,
//! the signer and the executor.

use crate::error::{PkpError, PkpResult};
use tiny_keccak::{Hasher, Keccak};

/// Keccak256 hash (Ethereum flavour, not SHA3-256)
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// Keccak256 over several slices without concatenating them first
pub fn keccak256_concat(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

/// Convert raw address bytes to checksummed Ethereum address
pub fn to_checksum_address(address: &[u8]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    let mut result = String::from("0x");
    for (i, ch) in lower.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };

        if ch.is_ascii_digit() {
            result.push(ch);
        } else if nibble >= 8 {
            result.push(ch.to_ascii_uppercase());
        } else {
            result.push(ch);
        }
    }

    result
}

/// Parse hex bytes, with or without a 0x prefix
pub fn parse_hex_bytes(hex_str: &str) -> PkpResult<Vec<u8>> {
    let cleaned = hex_str.trim_start_matches("0x").trim_start_matches("0X");
    hex::decode(cleaned)
        .map_err(|e| PkpError::parse_error(format!("Invalid hex '{}': {}", hex_str, e)))
}

/// Hex-encode with a 0x prefix
pub fn to_hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}
