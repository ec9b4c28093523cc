//! The executor module state machine

use super::events::{LogRecord, ModuleEvent};
use super::forwarder::{CallForwarder, ForwardedCall};
use super::guard::{ReentrancyLock, TransactionLock};
use super::operation::compute_operation_hash;
use super::registry::{Registry, RegistryChange};
use super::{ExecutorError, ExecutorResult, MODULE_TYPE};
use crate::abi::{AbiDecoder, AbiType, U256};
use crate::error::PkpResult;
use crate::message_signer::{recover_signer, to_eth_signed_message_hash, EcdsaSignature};
use crate::types::{Address, KeyId, PkpInfo, B256};
use crate::utils::config::ExecutorConfig;
use crate::utils::logging;
use crate::{log_debug, log_info, log_warn};
use std::sync::{Mutex, MutexGuard};

const LOG_TARGET: &str = "executor";

#[derive(Debug, Default)]
struct ModuleState {
    registry: Registry,
    /// Committed events only
    events: Vec<ModuleEvent>,
    /// Open while a forwarded call is in flight
    pending: Option<Pending>,
}

/// Effects of an execution that has not committed yet
#[derive(Debug, Default)]
struct Pending {
    events: Vec<ModuleEvent>,
    undo: Vec<RegistryChange>,
}

impl ModuleState {
    fn emit(&mut self, event: ModuleEvent) {
        match self.pending.as_mut() {
            Some(pending) => pending.events.push(event),
            None => self.events.push(event),
        }
    }

    fn journal(&mut self, change: RegistryChange) {
        if let Some(pending) = self.pending.as_mut() {
            pending.undo.push(change);
        }
    }
}

/// An execution past signature verification.
///
/// Dropping it without `commit` (forwarded call failed, or panicked)
/// undoes every registry change made since `begin` and discards the held
/// events.
struct Execution<'a> {
    module: &'a ExecutorModule,
    open: bool,
}

impl Execution<'_> {
    fn commit(mut self, event: ModuleEvent) {
        self.open = false;
        let mut state = self.module.state();
        if let Some(pending) = state.pending.take() {
            state.events.extend(pending.events);
        }
        state.events.push(event);
    }
}

impl Drop for Execution<'_> {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        let mut state = self.module.state();
        if let Some(pending) = state.pending.take() {
            for change in pending.undo.into_iter().rev() {
                state.registry.revert(change);
            }
        }
    }
}

/// One deployed instance of the PKP executor module.
///
/// Entry points take `&self`: a forwarded call receives the same module
/// and may call back into it while an execution is in flight. Calls from
/// other threads wait until that execution has committed or reverted.
#[derive(Debug)]
pub struct ExecutorModule {
    config: ExecutorConfig,
    state: Mutex<ModuleState>,
    transaction: TransactionLock,
    reentrancy: ReentrancyLock,
}

impl ExecutorModule {
    /// Build a module from a validated configuration
    pub fn new(config: ExecutorConfig) -> PkpResult<Self> {
        config.validate()?;
        if config.debug_logging {
            logging::enable_debug();
        }

        log_debug!(
            LOG_TARGET,
            "Executor module created",
            module = config.module_address,
            chain_id = config.chain_id,
        );

        Ok(Self {
            config,
            state: Mutex::new(ModuleState::default()),
            transaction: TransactionLock::new(),
            reentrancy: ReentrancyLock::new(),
        })
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Address the module is deployed at
    pub fn address(&self) -> Address {
        self.config.module_address
    }

    pub fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    fn state(&self) -> MutexGuard<'_, ModuleState> {
        // A panic while holding the lock cannot leave a half-written
        // registry: every mutation is a single insert/remove pair.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Register `signer` as the key owner for `account`
    pub fn install(&self, account: Address, signer: Address, key_id: KeyId) -> ExecutorResult<()> {
        let _txn = self.transaction.enter();
        let mut state = self.state();
        if let Err(e) = state.registry.register(account, signer, key_id) {
            log_warn!(LOG_TARGET, "Install rejected", account = account, signer = signer, reason = e);
            return Err(e);
        }
        state.journal(RegistryChange::Registered(account));
        state.emit(ModuleEvent::ModuleInstalled {
            account,
            signer_address: signer,
            key_id,
        });
        drop(state);

        log_info!(LOG_TARGET, "Module installed", account = account, signer = signer, key_id = key_id);
        Ok(())
    }

    /// Remove the registration of `account`
    pub fn uninstall(&self, account: Address) -> ExecutorResult<()> {
        let _txn = self.transaction.enter();
        let mut state = self.state();
        let info = match state.registry.remove(&account) {
            Ok(info) => info,
            Err(e) => {
                log_warn!(LOG_TARGET, "Uninstall rejected", account = account, reason = e);
                return Err(e);
            }
        };
        state.journal(RegistryChange::Removed(account, info));
        state.emit(ModuleEvent::ModuleUninstalled {
            account,
            signer_address: info.signer_address,
        });
        drop(state);

        log_info!(LOG_TARGET, "Module uninstalled", account = account, signer = info.signer_address);
        Ok(())
    }

    /// ERC-7579 `onInstall`: `init_data` is `abi.encode(address signer, bytes32 keyId)`
    pub fn on_install(&self, account: Address, init_data: &[u8]) -> ExecutorResult<()> {
        let values = AbiDecoder::decode(init_data, &[AbiType::Address, AbiType::Bytes32])
            .map_err(|e| ExecutorError::InvalidCalldata(e.to_string()))?;
        let field = |index: usize| {
            values.get(index).ok_or_else(|| {
                ExecutorError::InvalidCalldata(format!("init data is missing field {}", index))
            })
        };
        let signer = field(0)?
            .as_address()
            .map_err(|e| ExecutorError::InvalidCalldata(e.to_string()))?;
        let key_id = field(1)?
            .as_fixed_bytes()
            .map_err(|e| ExecutorError::InvalidCalldata(e.to_string()))?;

        self.install(account, Address(signer), B256(key_id))
    }

    /// ERC-7579 `onUninstall`; the payload is ignored
    pub fn on_uninstall(&self, account: Address, _data: &[u8]) -> ExecutorResult<()> {
        self.uninstall(account)
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// True if `module_type_id` is the executor type and `account` is registered
    pub fn is_module_installed(&self, account: &Address, module_type_id: u64) -> bool {
        let _txn = self.transaction.enter();
        self.is_module_type(module_type_id) && self.state().registry.is_installed(account)
    }

    pub fn is_module_type(&self, module_type_id: u64) -> bool {
        module_type_id == MODULE_TYPE.id()
    }

    /// Registration of `account`; the default record if there is none
    pub fn get_pkp_info(&self, account: &Address) -> PkpInfo {
        let _txn = self.transaction.enter();
        self.state().registry.get(account)
    }

    /// Account that currently claims `signer`
    pub fn account_for_signer(&self, signer: &Address) -> Option<Address> {
        let _txn = self.transaction.enter();
        self.state().registry.account_for_signer(signer)
    }

    /// Hash the registered signer must sign to authorize this operation
    pub fn get_operation_hash(&self, account: &Address, target: &Address, value: &U256, data: &[u8]) -> B256 {
        compute_operation_hash(
            account,
            target,
            value,
            data,
            self.config.chain_id,
            &self.config.module_address,
        )
    }

    /// True while an `execute_from_executor` call is in flight
    pub fn is_executing(&self) -> bool {
        self.reentrancy.is_entered()
    }

    /// Committed events, oldest first.
    ///
    /// Events of an execution still in flight are not included.
    pub fn logs(&self) -> Vec<ModuleEvent> {
        let _txn = self.transaction.enter();
        self.state().events.clone()
    }

    /// Drain committed events
    pub fn take_logs(&self) -> Vec<ModuleEvent> {
        let _txn = self.transaction.enter();
        std::mem::take(&mut self.state().events)
    }

    /// Committed events encoded as EVM logs
    pub fn log_records(&self) -> Vec<LogRecord> {
        let _txn = self.transaction.enter();
        let emitter = self.address();
        self.state().events.iter().map(|event| event.to_log(emitter)).collect()
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Verify `signature` over the operation and forward the call.
    ///
    /// `caller` is the smart account invoking the module. On success the
    /// forwarded call's return data is returned. If the forwarded call
    /// reverts, every change made since verification (including the
    /// verification event) is discarded and `ExecutionFailed` is returned.
    pub fn execute_from_executor<F>(
        &self,
        caller: Address,
        target: Address,
        value: U256,
        data: &[u8],
        signature: &[u8],
        forwarder: &mut F,
    ) -> ExecutorResult<Vec<u8>>
    where
        F: CallForwarder + ?Sized,
    {
        let _txn = self.transaction.enter();
        let _guard = match self.reentrancy.enter() {
            Ok(guard) => guard,
            Err(e) => {
                log_warn!(LOG_TARGET, "Reentrant execution rejected", account = caller, target = target);
                return Err(e);
            }
        };

        let info = self.get_pkp_info(&caller);
        if !info.installed {
            log_warn!(LOG_TARGET, "Execution rejected: not installed", account = caller);
            return Err(ExecutorError::NotInstalled);
        }

        let operation_hash = self.get_operation_hash(&caller, &target, &value, data);
        if let Err(e) = verify_signer(&operation_hash, signature, &info.signer_address) {
            log_warn!(
                LOG_TARGET,
                "Execution rejected: bad signature",
                account = caller,
                operation_hash = operation_hash,
                reason = e,
            );
            return Err(e);
        }

        let execution = self.begin(ModuleEvent::PkpSignatureVerified {
            account: caller,
            operation_hash,
            signer_address: info.signer_address,
        });

        log_debug!(
            LOG_TARGET,
            "PKP signature verified",
            account = caller,
            operation_hash = operation_hash,
            signer = info.signer_address,
        );

        let call = ForwardedCall {
            module: self.address(),
            account: caller,
            target,
            value,
            data: data.to_vec(),
        };

        match forwarder.forward(self, &call) {
            Ok(return_data) => {
                execution.commit(ModuleEvent::OperationExecuted {
                    account: caller,
                    target,
                    value,
                    data: call.data,
                });
                log_info!(
                    LOG_TARGET,
                    "Operation executed",
                    account = caller,
                    target = target,
                    value = value,
                    operation_hash = operation_hash,
                );
                Ok(return_data)
            }
            Err(failure) => {
                drop(execution);

                log_warn!(
                    LOG_TARGET,
                    "Forwarded call failed",
                    account = caller,
                    target = target,
                    revert_len = failure.revert_data.len(),
                );
                Err(ExecutorError::ExecutionFailed {
                    revert_data: failure.revert_data,
                })
            }
        }
    }

    /// Hold back events and journal registry writes until the forwarded
    /// call returns
    fn begin(&self, verified: ModuleEvent) -> Execution<'_> {
        self.state().pending = Some(Pending {
            events: vec![verified],
            undo: Vec::new(),
        });
        Execution {
            module: self,
            open: true,
        }
    }
}

/// Check that `signature` over the personal-message digest of
/// `operation_hash` recovers to `expected`
fn verify_signer(operation_hash: &B256, signature: &[u8], expected: &Address) -> ExecutorResult<()> {
    let signature =
        EcdsaSignature::from_bytes(signature).map_err(|e| ExecutorError::InvalidSignature(e.to_string()))?;
    let digest = to_eth_signed_message_hash(operation_hash);
    let recovered =
        recover_signer(&digest, &signature).map_err(|e| ExecutorError::InvalidSignature(e.to_string()))?;

    if recovered != *expected {
        return Err(ExecutorError::InvalidSignature(
            "recovered address is not the registered signer".to_string(),
        ));
    }
    Ok(())
}
