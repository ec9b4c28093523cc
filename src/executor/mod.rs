//! PKP Executor Module
//!
//! An ERC-7579 executor that lets a smart account forward calls once a PKP
//! (threshold-held key) has signed the operation:
//! - per-account registration of the authorized signer (`Registry`)
//! - canonical operation hashing bound to chain id and module address
//! - EIP-191 signature verification and a single forwarded call
//! - module-wide reentrancy exclusion around the forwarded call
//! - EVM-style event logs and ABI calldata dispatch

pub mod dispatch;
pub mod events;
pub mod forwarder;
pub mod guard;
pub mod module;
pub mod operation;
pub mod registry;

#[cfg(test)]
mod tests;

pub use events::{LogRecord, ModuleEvent};
pub use forwarder::{CallFailure, CallForwarder, ForwardedCall, RecordingForwarder};
pub use guard::{ReentrancyGuard, ReentrancyLock, TransactionGuard, TransactionLock};
pub use module::ExecutorModule;
pub use operation::compute_operation_hash;
pub use registry::{Registry, RegistryChange};

use crate::abi::AbiSelector;
use crate::types::ModuleType;

/// Module type this executor declares (ERC-7579 executor class)
pub const MODULE_TYPE: ModuleType = ModuleType::Executor;

/// Failures of the executor entry points
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutorError {
    #[error("Module already installed for this account")]
    AlreadyInstalled,

    #[error("Signer address is zero or claimed by another account")]
    UnauthorizedSigner,

    #[error("Module not installed for this account")]
    NotInstalled,

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Forwarded call failed ({} bytes of revert data)", .revert_data.len())]
    ExecutionFailed { revert_data: Vec<u8> },

    #[error("Reentrant call")]
    ReentrantCall,

    #[error("Invalid calldata: {0}")]
    InvalidCalldata(String),
}

impl ExecutorError {
    /// Solidity custom-error signature, if this failure has one
    pub fn error_signature(&self) -> Option<&'static str> {
        match self {
            ExecutorError::AlreadyInstalled => Some("AlreadyInstalled()"),
            ExecutorError::UnauthorizedSigner => Some("UnauthorizedSigner()"),
            ExecutorError::NotInstalled => Some("NotInstalled()"),
            ExecutorError::InvalidSignature(_) => Some("InvalidSignature()"),
            ExecutorError::ExecutionFailed { .. } => Some("ExecutionFailed()"),
            ExecutorError::ReentrantCall => Some("ReentrancyGuardReentrantCall()"),
            // A contract reverts with empty data on an unknown selector
            ExecutorError::InvalidCalldata(_) => None,
        }
    }

    /// Revert payload an EVM caller would observe
    pub fn revert_data(&self) -> Vec<u8> {
        self.error_signature()
            .map(|sig| AbiSelector::selector_from_signature(sig).to_vec())
            .unwrap_or_default()
    }
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;
