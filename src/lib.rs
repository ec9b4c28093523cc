//! PKP Executor
//!
//! A signature-verifying ERC-7579 executor module for smart accounts whose
//! authority is a PKP (a key pair held by a threshold-signing network).
//!
//! # Architecture
//!
//! This crate provides:
//! - **executor**: Install/uninstall registry, operation hashing, signature
//!   verification and the reentrancy-guarded forwarded call
//! - **message_signer**: EIP-191 prefix transform, secp256k1 recovery and
//!   the `HashSigner` seam for off-chain signers
//! - **abi**: The Solidity ABI subset used for hashing, events and calldata
//! - **utils**: Hashing helpers, structured logging, configuration
//!
//! # Security
//!
//! Signatures are verified over `keccak256("\x19Ethereum Signed Message:\n32" || hash)`
//! where `hash` binds account, target, value, data, chain id and module
//! address. High-`s` signatures are rejected. Local signing keys are zeroed
//! when dropped.
//!
//! # Example
//!
//! ```rust,ignore
//! use pkp_executor::{ExecutorConfig, ExecutorModule, HashSigner, LocalSigner, RecordingForwarder};
//!
//! let module = ExecutorModule::new(ExecutorConfig::from_env()?)?;
//! let signer = LocalSigner::random();
//! module.install(account, signer.address(), key_id)?;
//!
//! let hash = module.get_operation_hash(&account, &target, &value, &data);
//! let signature = signer.sign_hash(&hash)?.to_bytes();
//! let output = module.execute_from_executor(
//!     account, target, value, &data, &signature, &mut RecordingForwarder::default(),
//! )?;
//! ```

pub mod abi;
pub mod error;
pub mod executor;
pub mod message_signer;
pub mod serde_bytes;
pub mod types;
pub mod utils;

// Re-export key types for convenience
pub use abi::U256;
pub use error::{ErrorCode, PkpError, PkpResult};
pub use executor::dispatch::{ExecutorCall, ExecutorFunction};
pub use executor::{
    compute_operation_hash, CallFailure, CallForwarder, ExecutorError, ExecutorModule,
    ExecutorResult, ForwardedCall, LogRecord, ModuleEvent, RecordingForwarder, MODULE_TYPE,
};
pub use message_signer::{
    recover_signer, to_eth_signed_message_hash, EcdsaSignature, HashSigner, LocalSigner,
    SignatureError,
};
pub use types::{Address, KeyId, ModuleType, PkpInfo, B256};
pub use utils::config::ExecutorConfig;
