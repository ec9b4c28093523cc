//! Selectors and topics: keccak256 of canonical signatures

use super::types::{AbiEvent, AbiFunction};
use sha3::{Digest, Keccak256};

fn signature_hash(signature: &str) -> [u8; 32] {
    Keccak256::digest(signature.as_bytes()).into()
}

/// Selector and topic calculator
pub struct AbiSelector;

impl AbiSelector {
    /// First 4 bytes of keccak256 of a signature such as `getPKPInfo(address)`
    pub fn selector_from_signature(signature: &str) -> [u8; 4] {
        let hash = signature_hash(signature);
        [hash[0], hash[1], hash[2], hash[3]]
    }

    pub fn function_selector(function: &AbiFunction) -> [u8; 4] {
        Self::selector_from_signature(&function.signature())
    }

    /// topic0 of an event log
    pub fn event_topic(event: &AbiEvent) -> [u8; 32] {
        signature_hash(&event.signature())
    }
}
