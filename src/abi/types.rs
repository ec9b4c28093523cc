//! ABI type definitions for Solidity/EVM contracts
//!
//! Only the types the executor's interface uses: `uint256`, `address`,
//! `bool`, `bytes32` and dynamic `bytes`, plus tuples of them.

use super::uint::U256;
use std::fmt;

/// Solidity types understood by the encoder/decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiType {
    Uint256,
    Address,
    Bool,
    Bytes32,
    // Dynamic bytes
    Bytes,
    // Tuple (struct)
    Tuple(Vec<AbiType>),
}

impl AbiType {
    /// Check if the type is dynamic (requires offset encoding)
    pub fn is_dynamic(&self) -> bool {
        match self {
            AbiType::Bytes => true,
            AbiType::Tuple(components) => components.iter().any(|t| t.is_dynamic()),
            _ => false,
        }
    }

    /// Get the size in bytes a value takes in the head
    pub fn head_size(&self) -> usize {
        match self {
            AbiType::Tuple(components) if !self.is_dynamic() => {
                components.iter().map(|t| t.head_size()).sum()
            }
            _ => 32,
        }
    }

    /// Canonical type string used in signatures
    pub fn canonical_type(&self) -> String {
        match self {
            AbiType::Uint256 => "uint256".to_string(),
            AbiType::Address => "address".to_string(),
            AbiType::Bool => "bool".to_string(),
            AbiType::Bytes32 => "bytes32".to_string(),
            AbiType::Bytes => "bytes".to_string(),
            AbiType::Tuple(components) => {
                let inner: Vec<String> = components.iter().map(|t| t.canonical_type()).collect();
                format!("({})", inner.join(","))
            }
        }
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_type())
    }
}

/// ABI value - runtime representation of Solidity values
#[derive(Debug, Clone, PartialEq)]
pub enum AbiValue {
    Uint(U256),
    Address([u8; 20]),
    Bool(bool),
    // bytes32
    FixedBytes([u8; 32]),
    Bytes(Vec<u8>),
    Tuple(Vec<AbiValue>),
}

impl AbiValue {
    /// Create a Uint256 value from a u64
    pub fn uint256(value: u64) -> Self {
        AbiValue::Uint(U256::from(value))
    }

    /// Get the type of this value
    pub fn get_type(&self) -> AbiType {
        match self {
            AbiValue::Uint(_) => AbiType::Uint256,
            AbiValue::Address(_) => AbiType::Address,
            AbiValue::Bool(_) => AbiType::Bool,
            AbiValue::FixedBytes(_) => AbiType::Bytes32,
            AbiValue::Bytes(_) => AbiType::Bytes,
            AbiValue::Tuple(values) => AbiType::Tuple(values.iter().map(|v| v.get_type()).collect()),
        }
    }

    pub fn as_uint(&self) -> Result<U256, AbiError> {
        match self {
            AbiValue::Uint(u) => Ok(*u),
            other => Err(mismatch(AbiType::Uint256, other)),
        }
    }

    pub fn as_address(&self) -> Result<[u8; 20], AbiError> {
        match self {
            AbiValue::Address(a) => Ok(*a),
            other => Err(mismatch(AbiType::Address, other)),
        }
    }

    pub fn as_fixed_bytes(&self) -> Result<[u8; 32], AbiError> {
        match self {
            AbiValue::FixedBytes(b) => Ok(*b),
            other => Err(mismatch(AbiType::Bytes32, other)),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8], AbiError> {
        match self {
            AbiValue::Bytes(b) => Ok(b),
            other => Err(mismatch(AbiType::Bytes, other)),
        }
    }
}

fn mismatch(expected: AbiType, got: &AbiValue) -> AbiError {
    AbiError::TypeMismatch {
        expected: expected.canonical_type(),
        got: got.get_type().canonical_type(),
    }
}

/// Function definition (name + input types)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbiFunction {
    pub name: String,
    pub inputs: Vec<AbiType>,
    pub outputs: Vec<AbiType>,
}

impl AbiFunction {
    pub fn new(name: &str, inputs: Vec<AbiType>, outputs: Vec<AbiType>) -> Self {
        Self {
            name: name.to_string(),
            inputs,
            outputs,
        }
    }

    /// Canonical signature, e.g. `getPKPInfo(address)`
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.inputs.iter().map(|t| t.canonical_type()).collect();
        format!("{}({})", self.name, params.join(","))
    }
}

/// Event parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbiEventParam {
    pub param_type: AbiType,
    pub indexed: bool,
}

/// Event definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbiEvent {
    pub name: String,
    pub inputs: Vec<AbiEventParam>,
}

impl AbiEvent {
    pub fn new(name: &str, inputs: &[(AbiType, bool)]) -> Self {
        Self {
            name: name.to_string(),
            inputs: inputs
                .iter()
                .map(|(param_type, indexed)| AbiEventParam {
                    param_type: param_type.clone(),
                    indexed: *indexed,
                })
                .collect(),
        }
    }

    /// Canonical signature, e.g. `ModuleUninstalled(address,address)`
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .inputs
            .iter()
            .map(|p| p.param_type.canonical_type())
            .collect();
        format!("{}({})", self.name, params.join(","))
    }
}

/// ABI errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiError {
    /// Invalid value for type
    InvalidValue(String),
    /// Encoding error
    EncodingError(String),
    /// Decoding error
    DecodingError(String),
    /// Type mismatch
    TypeMismatch { expected: String, got: String },
    /// Overflow
    Overflow,
    /// Function not found
    FunctionNotFound(String),
}

impl fmt::Display for AbiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiError::InvalidValue(s) => write!(f, "Invalid value: {}", s),
            AbiError::EncodingError(s) => write!(f, "Encoding error: {}", s),
            AbiError::DecodingError(s) => write!(f, "Decoding error: {}", s),
            AbiError::TypeMismatch { expected, got } => {
                write!(f, "Type mismatch: expected {}, got {}", expected, got)
            }
            AbiError::Overflow => write!(f, "Numeric overflow"),
            AbiError::FunctionNotFound(s) => write!(f, "Function not found: {}", s),
        }
    }
}

impl std::error::Error for AbiError {}
