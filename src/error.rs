//! Unified error types for the PKP executor
//!
//! Module-level errors (`ExecutorError`, `SignatureError`, `AbiError`) are
//! folded into `PkpError` so callers at the edge (config loading, JSON
//! surfaces) get one serializable shape with a stable `ErrorCode`.

use crate::abi::AbiError;
use crate::executor::ExecutorError;
use crate::message_signer::SignatureError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for crate-level operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PkpError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl PkpError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, msg)
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidAddress, msg)
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, msg)
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }
}

impl fmt::Display for PkpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for PkpError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Input errors
    InvalidInput,
    InvalidAddress,
    InvalidCalldata,

    // Registry errors
    AlreadyInstalled,
    UnauthorizedSigner,
    NotInstalled,

    // Execution errors
    InvalidSignature,
    ExecutionFailed,
    ReentrantCall,

    // Signer errors
    SigningFailed,

    // Parse errors
    ParseError,
    AbiError,
    JsonError,
    HexError,

    // Setup
    ConfigError,

    // Internal
    Internal,
}

/// Result type alias for crate-level operations
pub type PkpResult<T> = Result<T, PkpError>;

// Conversions from module and library error types

impl From<ExecutorError> for PkpError {
    fn from(e: ExecutorError) -> Self {
        let code = match &e {
            ExecutorError::AlreadyInstalled => ErrorCode::AlreadyInstalled,
            ExecutorError::UnauthorizedSigner => ErrorCode::UnauthorizedSigner,
            ExecutorError::NotInstalled => ErrorCode::NotInstalled,
            ExecutorError::InvalidSignature(_) => ErrorCode::InvalidSignature,
            ExecutorError::ExecutionFailed { .. } => ErrorCode::ExecutionFailed,
            ExecutorError::ReentrantCall => ErrorCode::ReentrantCall,
            ExecutorError::InvalidCalldata(_) => ErrorCode::InvalidCalldata,
        };
        PkpError::new(code, e.to_string())
    }
}

impl From<SignatureError> for PkpError {
    fn from(e: SignatureError) -> Self {
        let code = match &e {
            SignatureError::InvalidPrivateKey(_) | SignatureError::SigningFailed(_) => {
                ErrorCode::SigningFailed
            }
            _ => ErrorCode::InvalidSignature,
        };
        PkpError::new(code, e.to_string())
    }
}

impl From<AbiError> for PkpError {
    fn from(e: AbiError) -> Self {
        PkpError::new(ErrorCode::AbiError, e.to_string())
    }
}

impl From<serde_json::Error> for PkpError {
    fn from(e: serde_json::Error) -> Self {
        PkpError::new(ErrorCode::JsonError, e.to_string())
    }
}

impl From<hex::FromHexError> for PkpError {
    fn from(e: hex::FromHexError) -> Self {
        PkpError::new(ErrorCode::HexError, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = PkpError::config_error("missing chain id")
            .with_details("PKP_EXECUTOR_CHAIN_ID is unset");

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("config_error"));
        assert!(json.contains("missing chain id"));
    }

    #[test]
    fn test_executor_error_codes() {
        let err: PkpError = ExecutorError::AlreadyInstalled.into();
        assert_eq!(err.code, ErrorCode::AlreadyInstalled);

        let err: PkpError = ExecutorError::ExecutionFailed { revert_data: vec![0xde, 0xad] }.into();
        assert_eq!(err.code, ErrorCode::ExecutionFailed);

        let err: PkpError = ExecutorError::ReentrantCall.into();
        assert_eq!(err.code, ErrorCode::ReentrantCall);
    }

    #[test]
    fn test_display_includes_details() {
        let err = PkpError::invalid_address("bad length").with_details("got 19 bytes");
        let shown = err.to_string();
        assert!(shown.contains("InvalidAddress"));
        assert!(shown.contains("got 19 bytes"));
    }
}
