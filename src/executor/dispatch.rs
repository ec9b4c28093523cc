//! ABI calldata dispatch
//!
//! Decodes `selector || abi.encode(args)` into an `ExecutorCall`, runs it
//! against the module and ABI-encodes the result, so the module can be
//! driven with the same bytes a smart account would send on chain.

use super::forwarder::CallForwarder;
use super::module::ExecutorModule;
use super::{ExecutorError, ExecutorResult};
use crate::abi::{AbiDecoder, AbiEncoder, AbiFunction, AbiSelector, AbiType, AbiValue, U256};
use crate::types::Address;
use std::sync::LazyLock;

/// External functions of the module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutorFunction {
    OnInstall,
    OnUninstall,
    ExecuteFromExecutor,
    IsModuleInstalled,
    IsModuleType,
    GetPkpInfo,
    GetOperationHash,
}

static SELECTORS: LazyLock<Vec<([u8; 4], ExecutorFunction)>> = LazyLock::new(|| {
    ExecutorFunction::ALL
        .iter()
        .map(|function| (AbiSelector::function_selector(&function.abi()), *function))
        .collect()
});

impl ExecutorFunction {
    pub const ALL: [ExecutorFunction; 7] = [
        ExecutorFunction::OnInstall,
        ExecutorFunction::OnUninstall,
        ExecutorFunction::ExecuteFromExecutor,
        ExecutorFunction::IsModuleInstalled,
        ExecutorFunction::IsModuleType,
        ExecutorFunction::GetPkpInfo,
        ExecutorFunction::GetOperationHash,
    ];

    pub fn abi(&self) -> AbiFunction {
        let (name, inputs, outputs) = match self {
            ExecutorFunction::OnInstall => ("onInstall", vec![AbiType::Bytes], vec![]),
            ExecutorFunction::OnUninstall => ("onUninstall", vec![AbiType::Bytes], vec![]),
            ExecutorFunction::ExecuteFromExecutor => (
                "executeFromExecutor",
                vec![AbiType::Address, AbiType::Uint256, AbiType::Bytes, AbiType::Bytes],
                vec![AbiType::Bytes],
            ),
            ExecutorFunction::IsModuleInstalled => (
                "isModuleInstalled",
                vec![AbiType::Address, AbiType::Uint256],
                vec![AbiType::Bool],
            ),
            ExecutorFunction::IsModuleType => {
                ("isModuleType", vec![AbiType::Uint256], vec![AbiType::Bool])
            }
            ExecutorFunction::GetPkpInfo => (
                "getPKPInfo",
                vec![AbiType::Address],
                vec![AbiType::Address, AbiType::Bytes32, AbiType::Bool],
            ),
            ExecutorFunction::GetOperationHash => (
                "getOperationHash",
                vec![AbiType::Address, AbiType::Address, AbiType::Uint256, AbiType::Bytes],
                vec![AbiType::Bytes32],
            ),
        };
        AbiFunction::new(name, inputs, outputs)
    }

    pub fn selector(&self) -> [u8; 4] {
        SELECTORS
            .iter()
            .find(|(_, function)| function == self)
            .map(|(selector, _)| *selector)
            .unwrap_or_else(|| AbiSelector::function_selector(&self.abi()))
    }

    pub fn from_selector(selector: [u8; 4]) -> Option<Self> {
        SELECTORS
            .iter()
            .find(|(known, _)| *known == selector)
            .map(|(_, function)| *function)
    }
}

/// A decoded external call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutorCall {
    OnInstall {
        data: Vec<u8>,
    },
    OnUninstall {
        data: Vec<u8>,
    },
    ExecuteFromExecutor {
        target: Address,
        value: U256,
        data: Vec<u8>,
        signature: Vec<u8>,
    },
    IsModuleInstalled {
        account: Address,
        module_type_id: U256,
    },
    IsModuleType {
        module_type_id: U256,
    },
    GetPkpInfo {
        account: Address,
    },
    GetOperationHash {
        account: Address,
        target: Address,
        value: U256,
        data: Vec<u8>,
    },
}

impl ExecutorCall {
    pub fn function(&self) -> ExecutorFunction {
        match self {
            ExecutorCall::OnInstall { .. } => ExecutorFunction::OnInstall,
            ExecutorCall::OnUninstall { .. } => ExecutorFunction::OnUninstall,
            ExecutorCall::ExecuteFromExecutor { .. } => ExecutorFunction::ExecuteFromExecutor,
            ExecutorCall::IsModuleInstalled { .. } => ExecutorFunction::IsModuleInstalled,
            ExecutorCall::IsModuleType { .. } => ExecutorFunction::IsModuleType,
            ExecutorCall::GetPkpInfo { .. } => ExecutorFunction::GetPkpInfo,
            ExecutorCall::GetOperationHash { .. } => ExecutorFunction::GetOperationHash,
        }
    }

    /// Parse calldata; unknown selectors and malformed arguments are
    /// `InvalidCalldata`
    pub fn decode(calldata: &[u8]) -> ExecutorResult<Self> {
        if calldata.len() < 4 {
            return Err(ExecutorError::InvalidCalldata(format!(
                "calldata too short: {} bytes",
                calldata.len()
            )));
        }

        let mut selector = [0u8; 4];
        selector.copy_from_slice(&calldata[..4]);
        let function = ExecutorFunction::from_selector(selector).ok_or_else(|| {
            ExecutorError::InvalidCalldata(format!("unknown selector 0x{}", hex::encode(selector)))
        })?;

        let args = Args(
            AbiDecoder::decode(&calldata[4..], &function.abi().inputs)
                .map_err(|e| ExecutorError::InvalidCalldata(e.to_string()))?,
        );

        let call = match function {
            ExecutorFunction::OnInstall => ExecutorCall::OnInstall { data: args.bytes(0)? },
            ExecutorFunction::OnUninstall => ExecutorCall::OnUninstall { data: args.bytes(0)? },
            ExecutorFunction::ExecuteFromExecutor => ExecutorCall::ExecuteFromExecutor {
                target: args.address(0)?,
                value: args.uint(1)?,
                data: args.bytes(2)?,
                signature: args.bytes(3)?,
            },
            ExecutorFunction::IsModuleInstalled => ExecutorCall::IsModuleInstalled {
                account: args.address(0)?,
                module_type_id: args.uint(1)?,
            },
            ExecutorFunction::IsModuleType => ExecutorCall::IsModuleType {
                module_type_id: args.uint(0)?,
            },
            ExecutorFunction::GetPkpInfo => ExecutorCall::GetPkpInfo {
                account: args.address(0)?,
            },
            ExecutorFunction::GetOperationHash => ExecutorCall::GetOperationHash {
                account: args.address(0)?,
                target: args.address(1)?,
                value: args.uint(2)?,
                data: args.bytes(3)?,
            },
        };
        Ok(call)
    }

    /// Build calldata for this call
    pub fn encode(&self) -> Vec<u8> {
        let args = match self {
            ExecutorCall::OnInstall { data } | ExecutorCall::OnUninstall { data } => {
                vec![AbiValue::Bytes(data.clone())]
            }
            ExecutorCall::ExecuteFromExecutor {
                target,
                value,
                data,
                signature,
            } => vec![
                AbiValue::Address(target.0),
                AbiValue::Uint(*value),
                AbiValue::Bytes(data.clone()),
                AbiValue::Bytes(signature.clone()),
            ],
            ExecutorCall::IsModuleInstalled {
                account,
                module_type_id,
            } => vec![AbiValue::Address(account.0), AbiValue::Uint(*module_type_id)],
            ExecutorCall::IsModuleType { module_type_id } => vec![AbiValue::Uint(*module_type_id)],
            ExecutorCall::GetPkpInfo { account } => vec![AbiValue::Address(account.0)],
            ExecutorCall::GetOperationHash {
                account,
                target,
                value,
                data,
            } => vec![
                AbiValue::Address(account.0),
                AbiValue::Address(target.0),
                AbiValue::Uint(*value),
                AbiValue::Bytes(data.clone()),
            ],
        };

        let mut calldata = self.function().selector().to_vec();
        calldata.extend_from_slice(&AbiEncoder::encode_values(&args));
        calldata
    }
}

/// Decoded arguments with typed, error-mapped accessors
struct Args(Vec<AbiValue>);

impl Args {
    fn get(&self, index: usize) -> ExecutorResult<&AbiValue> {
        self.0
            .get(index)
            .ok_or_else(|| ExecutorError::InvalidCalldata(format!("missing argument {}", index)))
    }

    fn address(&self, index: usize) -> ExecutorResult<Address> {
        self.get(index)?
            .as_address()
            .map(Address)
            .map_err(|e| ExecutorError::InvalidCalldata(e.to_string()))
    }

    fn uint(&self, index: usize) -> ExecutorResult<U256> {
        self.get(index)?
            .as_uint()
            .map_err(|e| ExecutorError::InvalidCalldata(e.to_string()))
    }

    fn bytes(&self, index: usize) -> ExecutorResult<Vec<u8>> {
        self.get(index)?
            .as_bytes()
            .map(<[u8]>::to_vec)
            .map_err(|e| ExecutorError::InvalidCalldata(e.to_string()))
    }
}

/// Type ids that do not fit in 64 bits are never a known module type
fn type_id(value: &U256) -> Option<u64> {
    value.to_u64()
}

impl ExecutorModule {
    /// Execute ABI calldata sent by `caller` and return ABI-encoded output.
    ///
    /// `caller` plays the role of `msg.sender`: it is the account whose
    /// registration install, uninstall and execute act on.
    pub fn call<F>(&self, caller: Address, calldata: &[u8], forwarder: &mut F) -> ExecutorResult<Vec<u8>>
    where
        F: CallForwarder + ?Sized,
    {
        let output = match ExecutorCall::decode(calldata)? {
            ExecutorCall::OnInstall { data } => {
                self.on_install(caller, &data)?;
                Vec::new()
            }
            ExecutorCall::OnUninstall { data } => {
                self.on_uninstall(caller, &data)?;
                Vec::new()
            }
            ExecutorCall::ExecuteFromExecutor {
                target,
                value,
                data,
                signature,
            } => {
                let return_data =
                    self.execute_from_executor(caller, target, value, &data, &signature, forwarder)?;
                AbiEncoder::encode_values(&[AbiValue::Bytes(return_data)])
            }
            ExecutorCall::IsModuleInstalled {
                account,
                module_type_id,
            } => {
                let installed = type_id(&module_type_id)
                    .is_some_and(|id| self.is_module_installed(&account, id));
                AbiEncoder::encode_values(&[AbiValue::Bool(installed)])
            }
            ExecutorCall::IsModuleType { module_type_id } => {
                let matches = type_id(&module_type_id).is_some_and(|id| self.is_module_type(id));
                AbiEncoder::encode_values(&[AbiValue::Bool(matches)])
            }
            ExecutorCall::GetPkpInfo { account } => {
                let info = self.get_pkp_info(&account);
                AbiEncoder::encode_values(&[
                    AbiValue::Address(info.signer_address.0),
                    AbiValue::FixedBytes(info.key_id.0),
                    AbiValue::Bool(info.installed),
                ])
            }
            ExecutorCall::GetOperationHash {
                account,
                target,
                value,
                data,
            } => {
                let hash = self.get_operation_hash(&account, &target, &value, &data);
                AbiEncoder::encode_values(&[AbiValue::FixedBytes(hash.0)])
            }
        };
        Ok(output)
    }
}
