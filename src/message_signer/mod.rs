//! Message Signing Module
//!
//! The executor only accepts signatures made through the Ethereum
//! personal-message interface (EIP-191), because that is the interface the
//! PKP network exposes. This module holds:
//! - the prefix-then-hash transform and address recovery (`ethereum`)
//! - the `HashSigner` seam the off-chain signer plugs into
//! - `LocalSigner`, an in-process secp256k1 key implementing it

pub mod ethereum;
pub mod local;

pub use ethereum::{
    personal_sign_hash, recover_signer, sign_digest, to_eth_signed_message_hash,
    ETH_MESSAGE_PREFIX,
};
pub use local::LocalSigner;

use crate::types::{Address, B256};
use crate::utils::crypto::to_hex_prefixed;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Upper bound for `s` (secp256k1n / 2); larger values are malleable twins
const SECP256K1N_HALF: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

/// Recoverable secp256k1 signature in Ethereum `r || s || v` layout
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct EcdsaSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// 27 or 28
    pub v: u8,
}

impl EcdsaSignature {
    pub const LENGTH: usize = 65;

    /// Build from compact `r || s` and a raw recovery id (0 or 1)
    pub fn from_compact(compact: &[u8; 64], recovery_id: u8) -> SignatureResult<Self> {
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&compact[..32]);
        s.copy_from_slice(&compact[32..]);
        let sig = Self { r, s, v: 27 + recovery_id };
        sig.check()?;
        Ok(sig)
    }

    /// Parse a 65-byte `r || s || v` signature.
    ///
    /// `v` may be 27/28 or the raw recovery id 0/1. High-`s` and zero
    /// components are rejected.
    pub fn from_bytes(bytes: &[u8]) -> SignatureResult<Self> {
        if bytes.len() != Self::LENGTH {
            return Err(SignatureError::InvalidLength(bytes.len()));
        }

        let v = match bytes[64] {
            0 | 1 => bytes[64] + 27,
            27 | 28 => bytes[64],
            other => return Err(SignatureError::InvalidRecoveryId(other)),
        };

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);

        let sig = Self { r, s, v };
        sig.check()?;
        Ok(sig)
    }

    fn check(&self) -> SignatureResult<()> {
        if self.r == [0u8; 32] || self.s == [0u8; 32] {
            return Err(SignatureError::InvalidSignature("zero r or s".to_string()));
        }
        // Big-endian byte arrays compare like the integers they encode
        if self.s > SECP256K1N_HALF {
            return Err(SignatureError::MalleableSignature);
        }
        if self.v != 27 && self.v != 28 {
            return Err(SignatureError::InvalidRecoveryId(self.v));
        }
        Ok(())
    }

    /// Raw recovery id (0 or 1)
    pub fn recovery_id(&self) -> u8 {
        self.v - 27
    }

    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    pub fn to_hex(&self) -> String {
        to_hex_prefixed(&self.to_bytes())
    }
}

impl fmt::Debug for EcdsaSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EcdsaSignature({})", self.to_hex())
    }
}

impl Serialize for EcdsaSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EcdsaSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)?;
        EcdsaSignature::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

/// Off-chain signer of operation hashes.
///
/// Implementations sign through a "sign this message" interface: the
/// personal-message prefix is applied to `hash` before signing, exactly as
/// the PKP network does.
pub trait HashSigner {
    /// Address the produced signatures recover to
    fn address(&self) -> Address;

    /// Sign a 32-byte hash as a personal message
    fn sign_hash(&self, hash: &B256) -> SignatureResult<EcdsaSignature>;
}

/// Error types for message signing and recovery
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid signature length: expected 65 bytes, got {0}")]
    InvalidLength(usize),

    #[error("Invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    #[error("Signature s value is in the upper half of the curve order")]
    MalleableSignature,

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Address recovery failed: {0}")]
    RecoveryFailed(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

pub type SignatureResult<T> = Result<T, SignatureError>;
