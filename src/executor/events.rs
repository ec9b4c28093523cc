//! Events emitted by the executor and their EVM log encoding

use crate::abi::{AbiEncoder, AbiEvent, AbiSelector, AbiType, AbiValue, U256};
use crate::types::{Address, KeyId, B256};
use serde::{Deserialize, Serialize};

/// Durable record of one state change or verified execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ModuleEvent {
    #[serde(rename_all = "camelCase")]
    ModuleInstalled {
        account: Address,
        signer_address: Address,
        key_id: KeyId,
    },

    #[serde(rename_all = "camelCase")]
    ModuleUninstalled {
        account: Address,
        signer_address: Address,
    },

    #[serde(rename = "PKPSignatureVerified", rename_all = "camelCase")]
    PkpSignatureVerified {
        account: Address,
        operation_hash: B256,
        signer_address: Address,
    },

    #[serde(rename_all = "camelCase")]
    OperationExecuted {
        account: Address,
        target: Address,
        value: U256,
        #[serde(with = "crate::serde_bytes::hex_vec")]
        data: Vec<u8>,
    },
}

impl ModuleEvent {
    /// Solidity declaration of this event (parameter types and indexing)
    pub fn abi_event(&self) -> AbiEvent {
        match self {
            ModuleEvent::ModuleInstalled { .. } => AbiEvent::new(
                "ModuleInstalled",
                &[(AbiType::Address, true), (AbiType::Address, true), (AbiType::Bytes32, false)],
            ),
            ModuleEvent::ModuleUninstalled { .. } => AbiEvent::new(
                "ModuleUninstalled",
                &[(AbiType::Address, true), (AbiType::Address, true)],
            ),
            ModuleEvent::PkpSignatureVerified { .. } => AbiEvent::new(
                "PKPSignatureVerified",
                &[(AbiType::Address, true), (AbiType::Bytes32, true), (AbiType::Address, true)],
            ),
            ModuleEvent::OperationExecuted { .. } => AbiEvent::new(
                "OperationExecuted",
                &[
                    (AbiType::Address, true),
                    (AbiType::Address, true),
                    (AbiType::Uint256, false),
                    (AbiType::Bytes, false),
                ],
            ),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModuleEvent::ModuleInstalled { .. } => "ModuleInstalled",
            ModuleEvent::ModuleUninstalled { .. } => "ModuleUninstalled",
            ModuleEvent::PkpSignatureVerified { .. } => "PKPSignatureVerified",
            ModuleEvent::OperationExecuted { .. } => "OperationExecuted",
        }
    }

    /// keccak256 of the event signature
    pub fn topic0(&self) -> B256 {
        B256(AbiSelector::event_topic(&self.abi_event()))
    }

    pub fn account(&self) -> Address {
        match self {
            ModuleEvent::ModuleInstalled { account, .. }
            | ModuleEvent::ModuleUninstalled { account, .. }
            | ModuleEvent::PkpSignatureVerified { account, .. }
            | ModuleEvent::OperationExecuted { account, .. } => *account,
        }
    }

    /// Encode as the log the module at `emitter` would write
    pub fn to_log(&self, emitter: Address) -> LogRecord {
        let mut topics = vec![self.topic0()];

        let data = match self {
            ModuleEvent::ModuleInstalled {
                account,
                signer_address,
                key_id,
            } => {
                topics.push(B256(account.to_word()));
                topics.push(B256(signer_address.to_word()));
                AbiEncoder::encode_values(&[AbiValue::FixedBytes(key_id.0)])
            }
            ModuleEvent::ModuleUninstalled {
                account,
                signer_address,
            } => {
                topics.push(B256(account.to_word()));
                topics.push(B256(signer_address.to_word()));
                Vec::new()
            }
            ModuleEvent::PkpSignatureVerified {
                account,
                operation_hash,
                signer_address,
            } => {
                topics.push(B256(account.to_word()));
                topics.push(*operation_hash);
                topics.push(B256(signer_address.to_word()));
                Vec::new()
            }
            ModuleEvent::OperationExecuted {
                account,
                target,
                value,
                data,
            } => {
                topics.push(B256(account.to_word()));
                topics.push(B256(target.to_word()));
                AbiEncoder::encode_values(&[AbiValue::Uint(*value), AbiValue::Bytes(data.clone())])
            }
        };

        LogRecord {
            address: emitter,
            topics,
            data,
        }
    }
}

/// EVM log entry: emitting contract, topics, non-indexed data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub address: Address,
    pub topics: Vec<B256>,
    #[serde(with = "crate::serde_bytes::hex_vec")]
    pub data: Vec<u8>,
}
