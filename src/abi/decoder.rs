//! ABI decoder for Solidity/EVM contracts
//!
//! Input is untrusted calldata: every offset and length is bounds-checked
//! before slicing.

use super::types::*;
use super::uint::U256;

/// ABI decoder
pub struct AbiDecoder;

impl AbiDecoder {
    /// Decode a single value from bytes according to its type
    pub fn decode_value(data: &[u8], abi_type: &AbiType, offset: usize) -> Result<(AbiValue, usize), AbiError> {
        let word = Self::word_at(data, offset)?;
        let next = offset + 32;

        match abi_type {
            AbiType::Uint256 => Ok((AbiValue::Uint(U256::from_be_bytes(word)), next)),

            AbiType::Address => {
                if word[..12].iter().any(|b| *b != 0) {
                    return Err(AbiError::DecodingError("Dirty high bytes in address".to_string()));
                }
                let mut addr = [0u8; 20];
                addr.copy_from_slice(&word[12..]);
                Ok((AbiValue::Address(addr), next))
            }

            AbiType::Bool => {
                if word[..31].iter().any(|b| *b != 0) || word[31] > 1 {
                    return Err(AbiError::DecodingError("Invalid bool encoding".to_string()));
                }
                Ok((AbiValue::Bool(word[31] == 1), next))
            }

            AbiType::Bytes32 => {
                let mut bytes = [0u8; 32];
                bytes.copy_from_slice(word);
                Ok((AbiValue::FixedBytes(bytes), next))
            }

            AbiType::Bytes => Self::decode_dynamic_bytes(data, offset),

            AbiType::Tuple(types) => Self::decode_tuple(data, offset, types),
        }
    }

    /// Decode multiple values (function arguments or return data)
    pub fn decode(data: &[u8], types: &[AbiType]) -> Result<Vec<AbiValue>, AbiError> {
        let (values, _) = Self::decode_tuple(data, 0, types)?;
        if let AbiValue::Tuple(values) = values {
            Ok(values)
        } else {
            Err(AbiError::DecodingError("Expected tuple".to_string()))
        }
    }

    /// Decode a tuple
    fn decode_tuple(data: &[u8], base_offset: usize, types: &[AbiType]) -> Result<(AbiValue, usize), AbiError> {
        let mut values = Vec::with_capacity(types.len());
        let mut head_offset = base_offset;

        for abi_type in types {
            if abi_type.is_dynamic() {
                let word = Self::word_at(data, head_offset)?;
                let relative = Self::word_to_usize(word)?;
                let data_offset = base_offset
                    .checked_add(relative)
                    .ok_or(AbiError::Overflow)?;

                let (value, _) = Self::decode_value(data, abi_type, data_offset)?;
                values.push(value);
                head_offset += 32;
            } else {
                let (value, new_offset) = Self::decode_value(data, abi_type, head_offset)?;
                values.push(value);
                head_offset = new_offset;
            }
        }

        Ok((AbiValue::Tuple(values), head_offset))
    }

    /// Decode dynamic bytes (length word followed by data)
    fn decode_dynamic_bytes(data: &[u8], offset: usize) -> Result<(AbiValue, usize), AbiError> {
        let len = Self::word_to_usize(Self::word_at(data, offset)?)?;
        let start = offset + 32;
        let end = start.checked_add(len).ok_or(AbiError::Overflow)?;

        if data.len() < end {
            return Err(AbiError::DecodingError(format!(
                "Bytes length {} exceeds available data",
                len
            )));
        }

        let padded_len = len.div_ceil(32) * 32;
        Ok((AbiValue::Bytes(data[start..end].to_vec()), start + padded_len))
    }

    fn word_at(data: &[u8], offset: usize) -> Result<&[u8], AbiError> {
        let end = offset.checked_add(32).ok_or(AbiError::Overflow)?;
        data.get(offset..end)
            .ok_or_else(|| AbiError::DecodingError("Insufficient data".to_string()))
    }

    fn word_to_usize(word: &[u8]) -> Result<usize, AbiError> {
        U256::from_be_bytes(word)
            .to_u64()
            .and_then(|v| usize::try_from(v).ok())
            .ok_or(AbiError::Overflow)
    }
}
