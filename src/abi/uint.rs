//! `uint256` values
//!
//! Stored as the 32-byte big-endian word the ABI uses, so encoding is a
//! copy and the derived ordering is numeric ordering.

use super::types::AbiError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// 256-bit unsigned integer
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct U256([u8; 32]);

impl U256 {
    pub const ZERO: U256 = U256([0; 32]);
    pub const ONE: U256 = {
        let mut word = [0u8; 32];
        word[31] = 1;
        U256(word)
    };
    pub const MAX: U256 = U256([0xff; 32]);

    pub fn from(value: u64) -> Self {
        Self::from_u128(u128::from(value))
    }

    pub fn from_u128(value: u128) -> Self {
        let mut word = [0u8; 32];
        word[16..].copy_from_slice(&value.to_be_bytes());
        U256(word)
    }

    /// Big-endian bytes; longer input keeps its low 32 bytes
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let take = bytes.len().min(32);
        let mut word = [0u8; 32];
        word[32 - take..].copy_from_slice(&bytes[bytes.len() - take..]);
        U256(word)
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// Parse hex, with or without `0x`
    pub fn from_hex(s: &str) -> Result<Self, AbiError> {
        let digits = s.trim_start_matches("0x").trim_start_matches("0X");
        if digits.is_empty() {
            return Err(AbiError::InvalidValue("Empty hex string".to_string()));
        }
        if digits.len() > 64 {
            return Err(AbiError::Overflow);
        }
        let even = if digits.len() % 2 == 1 {
            format!("0{}", digits)
        } else {
            digits.to_string()
        };
        let bytes = hex::decode(even).map_err(|e| AbiError::InvalidValue(e.to_string()))?;
        Ok(Self::from_be_bytes(&bytes))
    }

    /// Parse a decimal string
    pub fn from_dec(s: &str) -> Result<Self, AbiError> {
        if s.is_empty() {
            return Err(AbiError::InvalidValue("Empty decimal string".to_string()));
        }
        s.chars().try_fold(U256::ZERO, |acc, c| {
            let digit = c
                .to_digit(10)
                .ok_or_else(|| AbiError::InvalidValue(format!("Invalid decimal digit: {}", c)))?;
            acc.mul_add_small(10, digit as u8).ok_or(AbiError::Overflow)
        })
    }

    /// `self * factor + addend`, or `None` on overflow
    fn mul_add_small(&self, factor: u8, addend: u8) -> Option<U256> {
        let mut word = [0u8; 32];
        let mut carry = u16::from(addend);
        for (out, byte) in word.iter_mut().zip(self.0.iter()).rev() {
            let acc = u16::from(*byte) * u16::from(factor) + carry;
            *out = acc as u8;
            carry = acc >> 8;
        }
        (carry == 0).then_some(U256(word))
    }

    /// Quotient and remainder of division by a non-zero byte
    fn div_rem_small(&self, divisor: u8) -> (U256, u8) {
        let mut word = [0u8; 32];
        let mut rem = 0u16;
        for (out, byte) in word.iter_mut().zip(self.0.iter()) {
            let acc = (rem << 8) | u16::from(*byte);
            *out = (acc / u16::from(divisor)) as u8;
            rem = acc % u16::from(divisor);
        }
        (U256(word), rem as u8)
    }

    pub fn checked_add(&self, other: U256) -> Option<U256> {
        let mut word = [0u8; 32];
        let mut carry = 0u16;
        for i in (0..32).rev() {
            let acc = u16::from(self.0[i]) + u16::from(other.0[i]) + carry;
            word[i] = acc as u8;
            carry = acc >> 8;
        }
        (carry == 0).then_some(U256(word))
    }

    pub fn checked_sub(&self, other: U256) -> Option<U256> {
        if other > *self {
            return None;
        }
        let mut word = [0u8; 32];
        let mut borrow = 0i16;
        for i in (0..32).rev() {
            let mut acc = i16::from(self.0[i]) - i16::from(other.0[i]) - borrow;
            borrow = 0;
            if acc < 0 {
                acc += 256;
                borrow = 1;
            }
            word[i] = acc as u8;
        }
        Some(U256(word))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Value as `u64`, if it fits
    pub fn to_u64(&self) -> Option<u64> {
        if self.0[..24].iter().any(|b| *b != 0) {
            return None;
        }
        let mut low = [0u8; 8];
        low.copy_from_slice(&self.0[24..]);
        Some(u64::from_be_bytes(low))
    }

    pub fn to_dec_string(&self) -> String {
        if self.is_zero() {
            return "0".to_string();
        }
        let mut digits = Vec::with_capacity(78);
        let mut rest = *self;
        while !rest.is_zero() {
            let (quotient, digit) = rest.div_rem_small(10);
            digits.push(b'0' + digit);
            rest = quotient;
        }
        digits.reverse();
        String::from_utf8_lossy(&digits).into_owned()
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dec_string())
    }
}

impl fmt::Debug for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U256({})", self.to_dec_string())
    }
}

// Decimal strings: wei amounts overflow JSON numbers
impl Serialize for U256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_dec_string())
    }
}

impl<'de> Deserialize<'de> for U256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let parsed = if s.starts_with("0x") || s.starts_with("0X") {
            U256::from_hex(&s)
        } else {
            U256::from_dec(&s)
        };
        parsed.map_err(serde::de::Error::custom)
    }
}
