//! Ethereum Personal Message Signing (EIP-191)
//!
//! Reference: https://eips.ethereum.org/EIPS/eip-191
//!
//! Format: "\x19Ethereum Signed Message:\n" + len(message) + message
//!
//! The executor signs 32-byte operation hashes, so the length marker is
//! always "32"; `to_eth_signed_message_hash` is that fixed-length case.

use super::{EcdsaSignature, SignatureError, SignatureResult};
use crate::types::{Address, B256};
use crate::utils::crypto::{keccak256, keccak256_concat};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

/// Ethereum message prefix for personal_sign
pub const ETH_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// Hash a message with the Ethereum personal sign prefix
pub fn personal_sign_hash(message: &[u8]) -> [u8; 32] {
    let prefix = format!("{}{}", ETH_MESSAGE_PREFIX, message.len());
    keccak256_concat(&[prefix.as_bytes(), message])
}

/// Digest a signer produces when asked to personal-sign a 32-byte hash
pub fn to_eth_signed_message_hash(hash: &B256) -> B256 {
    B256(keccak256_concat(&[ETH_MESSAGE_PREFIX.as_bytes(), b"32", hash.as_bytes()]))
}

/// Derive the Ethereum address of a public key
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    // Uncompressed key is 0x04 || X || Y; the address hashes X || Y
    let pub_key_bytes = public_key.serialize_uncompressed();
    let pub_key_hash = keccak256(&pub_key_bytes[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&pub_key_hash[12..]);
    Address(address)
}

/// Sign a digest directly (no prefix applied)
pub fn sign_digest(digest: &B256, private_key: &[u8]) -> SignatureResult<EcdsaSignature> {
    if private_key.len() != 32 {
        return Err(SignatureError::InvalidPrivateKey(format!(
            "Expected 32 bytes, got {}",
            private_key.len()
        )));
    }

    let secp = Secp256k1::new();
    let secret_key = SecretKey::from_slice(private_key)
        .map_err(|e| SignatureError::InvalidPrivateKey(e.to_string()))?;

    let msg = Message::from_digest(digest.0);
    let sig = secp.sign_ecdsa_recoverable(&msg, &secret_key);
    let (recovery_id, sig_bytes) = sig.serialize_compact();

    let recovery_id = u8::try_from(recovery_id.to_i32())
        .map_err(|e| SignatureError::SigningFailed(e.to_string()))?;

    EcdsaSignature::from_compact(&sig_bytes, recovery_id)
        .map_err(|e| SignatureError::SigningFailed(e.to_string()))
}

/// Recover the address that signed `digest`.
///
/// `digest` is the value that was actually signed; for executor
/// operations that is `to_eth_signed_message_hash(operation_hash)`.
pub fn recover_signer(digest: &B256, signature: &EcdsaSignature) -> SignatureResult<Address> {
    let secp = Secp256k1::new();
    let msg = Message::from_digest(digest.0);

    let rec_id = RecoveryId::from_i32(i32::from(signature.recovery_id()))
        .map_err(|e| SignatureError::InvalidSignature(e.to_string()))?;

    let mut compact = [0u8; 64];
    compact[..32].copy_from_slice(&signature.r);
    compact[32..].copy_from_slice(&signature.s);

    let recoverable_sig = RecoverableSignature::from_compact(&compact, rec_id)
        .map_err(|e| SignatureError::InvalidSignature(e.to_string()))?;

    let public_key = secp
        .recover_ecdsa(&msg, &recoverable_sig)
        .map_err(|e| SignatureError::RecoveryFailed(e.to_string()))?;

    Ok(public_key_to_address(&public_key))
}
