//! In-process secp256k1 signer
//!
//! Stands in for the PKP network: holds one private key and signs
//! operation hashes through the personal-message prefix. The key bytes are
//! wiped when the signer is dropped.

use super::ethereum::{public_key_to_address, sign_digest, to_eth_signed_message_hash};
use super::{EcdsaSignature, HashSigner, SignatureError, SignatureResult};
use crate::types::{Address, B256};
use crate::utils::crypto::parse_hex_bytes;
use rand::rngs::OsRng;
use rand::RngCore;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use zeroize::{Zeroize, ZeroizeOnDrop};

#[derive(Zeroize, ZeroizeOnDrop)]
pub struct LocalSigner {
    secret: [u8; 32],
    #[zeroize(skip)]
    address: Address,
}

impl LocalSigner {
    /// Build from raw private key bytes
    pub fn from_bytes(private_key: &[u8]) -> SignatureResult<Self> {
        if private_key.len() != 32 {
            return Err(SignatureError::InvalidPrivateKey(format!(
                "Expected 32 bytes, got {}",
                private_key.len()
            )));
        }

        let secp = Secp256k1::new();
        let secret_key = SecretKey::from_slice(private_key)
            .map_err(|e| SignatureError::InvalidPrivateKey(e.to_string()))?;
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);

        let mut secret = [0u8; 32];
        secret.copy_from_slice(private_key);

        Ok(Self {
            secret,
            address: public_key_to_address(&public_key),
        })
    }

    /// Build from a hex private key (with or without 0x)
    pub fn from_hex(private_key_hex: &str) -> SignatureResult<Self> {
        let mut bytes = parse_hex_bytes(private_key_hex)
            .map_err(|e| SignatureError::InvalidPrivateKey(e.message))?;
        let signer = Self::from_bytes(&bytes);
        bytes.zeroize();
        signer
    }

    /// Generate a fresh key from the OS RNG
    pub fn random() -> Self {
        let mut rng = OsRng;
        loop {
            let mut candidate = [0u8; 32];
            rng.fill_bytes(&mut candidate);
            let signer = Self::from_bytes(&candidate);
            candidate.zeroize();
            // Out-of-range scalars are astronomically rare; draw again
            if let Ok(signer) = signer {
                return signer;
            }
        }
    }

    /// Sign a digest as-is, without the personal-message prefix
    pub fn sign_raw_digest(&self, digest: &B256) -> SignatureResult<EcdsaSignature> {
        sign_digest(digest, &self.secret)
    }
}

impl HashSigner for LocalSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn sign_hash(&self, hash: &B256) -> SignatureResult<EcdsaSignature> {
        let digest = to_eth_signed_message_hash(hash);
        sign_digest(&digest, &self.secret)
    }
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
