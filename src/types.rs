//! Shared types for the PKP executor
//!
//! Fixed-width EVM primitives and the per-account registration record.
//! Everything here serializes to the hex strings an EVM tool would print.

use crate::error::{PkpError, PkpResult};
use crate::utils::crypto::{parse_hex_bytes, to_checksum_address, to_hex_prefixed};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Address
// =============================================================================

/// 20-byte EVM account address
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    /// Build from a 20-byte slice
    pub fn from_slice(bytes: &[u8]) -> PkpResult<Self> {
        if bytes.len() != 20 {
            return Err(PkpError::invalid_address(format!(
                "Expected 20 bytes, got {}",
                bytes.len()
            )));
        }
        let mut out = [0u8; 20];
        out.copy_from_slice(bytes);
        Ok(Address(out))
    }

    /// Take the low 20 bytes of a 32-byte word (ABI / topic layout)
    pub fn from_word(word: &[u8; 32]) -> Self {
        let mut out = [0u8; 20];
        out.copy_from_slice(&word[12..]);
        Address(out)
    }

    /// Left-pad to a 32-byte word
    pub fn to_word(&self) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&self.0);
        word
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// EIP-55 checksummed form
    pub fn to_checksum(&self) -> String {
        to_checksum_address(&self.0)
    }
}

impl FromStr for Address {
    type Err = PkpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = parse_hex_bytes(s.trim())
            .map_err(|e| PkpError::invalid_address(format!("Invalid address '{}'", s)).with_details(e.message))?;
        Address::from_slice(&bytes)
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_checksum())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_checksum())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// B256
// =============================================================================

/// 32-byte word: hashes and opaque key identifiers
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct B256(pub [u8; 32]);

/// Identifier of the PKP key pair a registration refers to
pub type KeyId = B256;

impl B256 {
    pub const ZERO: B256 = B256([0u8; 32]);

    pub fn from_slice(bytes: &[u8]) -> PkpResult<Self> {
        if bytes.len() != 32 {
            return Err(PkpError::invalid_input(format!(
                "Expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(bytes);
        Ok(B256(out))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        to_hex_prefixed(&self.0)
    }
}

impl FromStr for B256 {
    type Err = PkpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = parse_hex_bytes(s.trim())?;
        B256::from_slice(&bytes)
    }
}

impl From<[u8; 32]> for B256 {
    fn from(bytes: [u8; 32]) -> Self {
        B256(bytes)
    }
}

impl fmt::Display for B256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for B256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B256({})", self.to_hex())
    }
}

impl Serialize for B256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for B256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Module classification
// =============================================================================

/// ERC-7579 module type ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    Validator,
    Executor,
    Fallback,
    Hook,
}

impl ModuleType {
    pub fn id(&self) -> u64 {
        match self {
            ModuleType::Validator => 1,
            ModuleType::Executor => 2,
            ModuleType::Fallback => 3,
            ModuleType::Hook => 4,
        }
    }

    pub fn from_id(id: u64) -> Option<Self> {
        match id {
            1 => Some(ModuleType::Validator),
            2 => Some(ModuleType::Executor),
            3 => Some(ModuleType::Fallback),
            4 => Some(ModuleType::Hook),
            _ => None,
        }
    }
}

// =============================================================================
// Registration record
// =============================================================================

/// Per-account registration of the PKP allowed to authorize executions.
///
/// The default value is the "not installed" record returned for accounts
/// that never installed the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PkpInfo {
    pub signer_address: Address,
    pub key_id: KeyId,
    pub installed: bool,
}

impl PkpInfo {
    pub fn new(signer_address: Address, key_id: KeyId) -> Self {
        Self {
            signer_address,
            key_id,
            installed: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn test_address_parse_and_display() {
        let addr: Address = ADDR.parse().unwrap();
        assert_eq!(addr.to_string(), ADDR);

        let lower: Address = ADDR.to_lowercase().parse().unwrap();
        assert_eq!(lower, addr);
    }

    #[test]
    fn test_address_rejects_bad_length() {
        assert!("0x1234".parse::<Address>().is_err());
        assert!("0xzz9Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse::<Address>().is_err());
    }

    #[test]
    fn test_address_word_layout() {
        let addr = Address([0xab; 20]);
        let word = addr.to_word();
        assert_eq!(&word[..12], &[0u8; 12]);
        assert_eq!(Address::from_word(&word), addr);
    }

    #[test]
    fn test_b256_roundtrip_str() {
        let key_id = B256([0x11; 32]);
        let parsed: B256 = key_id.to_string().parse().unwrap();
        assert_eq!(parsed, key_id);
        assert!("0x11".parse::<B256>().is_err());
    }

    #[test]
    fn test_module_type_ids() {
        assert_eq!(ModuleType::Executor.id(), 2);
        assert_eq!(ModuleType::from_id(2), Some(ModuleType::Executor));
        assert_eq!(ModuleType::from_id(0), None);
        assert_eq!(ModuleType::from_id(5), None);
    }

    #[test]
    fn test_pkp_info_default_is_uninstalled() {
        let info = PkpInfo::default();
        assert!(!info.installed);
        assert!(info.signer_address.is_zero());
        assert!(info.key_id.is_zero());
    }

    #[test]
    fn test_pkp_info_serde() {
        let info = PkpInfo::new(ADDR.parse().unwrap(), B256([0x22; 32]));
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("signerAddress"));
        assert!(json.contains(ADDR));

        let back: PkpInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
    }
}
