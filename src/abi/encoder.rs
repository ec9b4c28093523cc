//! ABI encoder for Solidity/EVM contracts

use super::types::*;
use super::uint::U256;

/// ABI encoder
pub struct AbiEncoder;

impl AbiEncoder {
    /// Encode a single value according to its type
    pub fn encode_value(value: &AbiValue, abi_type: &AbiType) -> Result<Vec<u8>, AbiError> {
        let actual = value.get_type();
        if actual != *abi_type {
            return Err(AbiError::TypeMismatch {
                expected: abi_type.canonical_type(),
                got: actual.canonical_type(),
            });
        }
        Ok(Self::encode_inferred(value))
    }

    /// Encode multiple values (`abi.encode(...)`)
    pub fn encode(values: &[AbiValue], types: &[AbiType]) -> Result<Vec<u8>, AbiError> {
        if values.len() != types.len() {
            return Err(AbiError::EncodingError(format!(
                "Value count {} doesn't match type count {}",
                values.len(),
                types.len()
            )));
        }
        for (value, abi_type) in values.iter().zip(types) {
            let actual = value.get_type();
            if actual != *abi_type {
                return Err(AbiError::TypeMismatch {
                    expected: abi_type.canonical_type(),
                    got: actual.canonical_type(),
                });
            }
        }

        Ok(Self::encode_tuple(values))
    }

    /// Encode values, taking each type from the value itself.
    ///
    /// Cannot fail: there is no declared type to disagree with.
    pub fn encode_values(values: &[AbiValue]) -> Vec<u8> {
        Self::encode_tuple(values)
    }

    fn encode_inferred(value: &AbiValue) -> Vec<u8> {
        match value {
            AbiValue::Uint(u) => u.to_be_bytes().to_vec(),

            // Address, left-padded
            AbiValue::Address(addr) => {
                let mut result = [0u8; 32];
                result[12..].copy_from_slice(addr);
                result.to_vec()
            }

            AbiValue::Bool(b) => {
                let mut result = [0u8; 32];
                result[31] = u8::from(*b);
                result.to_vec()
            }

            AbiValue::FixedBytes(bytes) => bytes.to_vec(),

            AbiValue::Bytes(bytes) => Self::encode_dynamic_bytes(bytes),

            AbiValue::Tuple(values) => Self::encode_tuple(values),
        }
    }

    /// Encode a tuple (also used for function parameters)
    fn encode_tuple(values: &[AbiValue]) -> Vec<u8> {
        let types: Vec<AbiType> = values.iter().map(|v| v.get_type()).collect();
        let head_size: usize = types.iter().map(|t| t.head_size()).sum();

        let mut head = Vec::with_capacity(head_size);
        let mut tail = Vec::new();

        for (value, abi_type) in values.iter().zip(types.iter()) {
            let encoded = Self::encode_inferred(value);
            if abi_type.is_dynamic() {
                // Head holds the offset of the value in the tail
                let offset = U256::from((head_size + tail.len()) as u64);
                head.extend_from_slice(&offset.to_be_bytes());
                tail.extend_from_slice(&encoded);
            } else {
                head.extend_from_slice(&encoded);
            }
        }

        head.extend_from_slice(&tail);
        head
    }

    /// Encode dynamic bytes: 32-byte length, then data right-padded to a word
    fn encode_dynamic_bytes(bytes: &[u8]) -> Vec<u8> {
        let len = bytes.len();
        let padded_len = len.div_ceil(32) * 32;

        let mut result = Vec::with_capacity(32 + padded_len);
        result.extend_from_slice(&U256::from(len as u64).to_be_bytes());
        result.extend_from_slice(bytes);
        result.resize(32 + padded_len, 0);
        result
    }

    /// Encode a function call (selector + parameters)
    pub fn encode_function_call(
        function: &AbiFunction,
        values: &[AbiValue],
    ) -> Result<Vec<u8>, AbiError> {
        use super::selector::AbiSelector;

        let selector = AbiSelector::function_selector(function);
        let encoded_params = Self::encode(values, &function.inputs)?;

        let mut result = Vec::with_capacity(4 + encoded_params.len());
        result.extend_from_slice(&selector);
        result.extend_from_slice(&encoded_params);
        Ok(result)
    }
}
