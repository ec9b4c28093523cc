//! Operation hashing
//!
//! `keccak256(abi.encode(account, target, value, data, chainId, module))`.
//! Static fields are padded to full words and `data` is length-prefixed in
//! the tail, so no two distinct operations share an encoding.

use crate::abi::{AbiEncoder, AbiValue, U256};
use crate::types::{Address, B256};
use crate::utils::crypto::keccak256;

/// Hash a signer must sign (through the personal-message prefix) to
/// authorize `account` calling `target` with `value` and `data` on the
/// module deployed at `module` on `chain_id`.
pub fn compute_operation_hash(
    account: &Address,
    target: &Address,
    value: &U256,
    data: &[u8],
    chain_id: u64,
    module: &Address,
) -> B256 {
    let encoded = AbiEncoder::encode_values(&[
        AbiValue::Address(account.0),
        AbiValue::Address(target.0),
        AbiValue::Uint(*value),
        AbiValue::Bytes(data.to_vec()),
        AbiValue::uint256(chain_id),
        AbiValue::Address(module.0),
    ]);
    B256(keccak256(&encoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address([byte; 20])
    }

    fn hash(value: u64, data: &[u8]) -> B256 {
        compute_operation_hash(&addr(1), &addr(2), &U256::from(value), data, 1, &addr(3))
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(hash(5, b"abc"), hash(5, b"abc"));
    }

    #[test]
    fn test_value_changes_hash() {
        assert_ne!(hash(0, b""), hash(1, b""));
    }

    #[test]
    fn test_data_boundary_shift() {
        // Trailing zero byte must not collapse into the padding
        assert_ne!(hash(0, &[0xab]), hash(0, &[0xab, 0x00]));
        assert_ne!(hash(0, b""), hash(0, &[0x00]));
    }

    #[test]
    fn test_bound_to_chain_and_module() {
        let base = compute_operation_hash(&addr(1), &addr(2), &U256::ZERO, b"", 1, &addr(3));
        let other_chain = compute_operation_hash(&addr(1), &addr(2), &U256::ZERO, b"", 10, &addr(3));
        let other_module = compute_operation_hash(&addr(1), &addr(2), &U256::ZERO, b"", 1, &addr(4));
        assert_ne!(base, other_chain);
        assert_ne!(base, other_module);
    }

    #[test]
    fn test_account_and_target_not_interchangeable() {
        let forward = compute_operation_hash(&addr(1), &addr(2), &U256::ZERO, b"", 1, &addr(3));
        let swapped = compute_operation_hash(&addr(2), &addr(1), &U256::ZERO, b"", 1, &addr(3));
        assert_ne!(forward, swapped);
    }

    #[test]
    fn test_encoding_layout() {
        // 6 head words + length word + one padded data word
        let encoded = AbiEncoder::encode_values(&[
            AbiValue::Address([1; 20]),
            AbiValue::Address([2; 20]),
            AbiValue::uint256(0),
            AbiValue::Bytes(vec![0xff]),
            AbiValue::uint256(1),
            AbiValue::Address([3; 20]),
        ]);
        assert_eq!(encoded.len(), 8 * 32);
        // Offset of `data` points past the head
        assert_eq!(encoded[3 * 32 + 31], 0xc0);
        assert_eq!(encoded[6 * 32 + 31], 1);
        assert_eq!(encoded[7 * 32], 0xff);
    }
}
