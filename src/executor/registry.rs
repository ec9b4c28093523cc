//! Account registry and signer reverse index

use super::{ExecutorError, ExecutorResult};
use crate::types::{Address, KeyId, PkpInfo};
use std::collections::HashMap;

/// One registry write, recorded so a reverted execution can undo it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryChange {
    Registered(Address),
    Removed(Address, PkpInfo),
}

/// Both lookup tables of the module.
///
/// `accounts` and `signers` always describe the same set of registrations:
/// every entry in `accounts` has exactly one entry in `signers` pointing
/// back at it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    accounts: HashMap<Address, PkpInfo>,
    signers: HashMap<Address, Address>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registration for `account`, or the default record
    pub fn get(&self, account: &Address) -> PkpInfo {
        self.accounts.get(account).copied().unwrap_or_default()
    }

    pub fn is_installed(&self, account: &Address) -> bool {
        self.accounts.get(account).is_some_and(|info| info.installed)
    }

    /// Account currently claiming `signer`
    pub fn account_for_signer(&self, signer: &Address) -> Option<Address> {
        self.signers.get(signer).copied()
    }

    /// Write a registration for `account`.
    ///
    /// Checks run in a fixed order: existing registration first, then the
    /// signer. Nothing is written unless both pass.
    pub fn register(
        &mut self,
        account: Address,
        signer: Address,
        key_id: KeyId,
    ) -> ExecutorResult<PkpInfo> {
        if self.is_installed(&account) {
            return Err(ExecutorError::AlreadyInstalled);
        }
        if signer.is_zero() || self.signers.contains_key(&signer) {
            return Err(ExecutorError::UnauthorizedSigner);
        }

        let info = PkpInfo::new(signer, key_id);
        self.accounts.insert(account, info);
        self.signers.insert(signer, account);
        Ok(info)
    }

    /// Delete the registration of `account` and its reverse entry
    pub fn remove(&mut self, account: &Address) -> ExecutorResult<PkpInfo> {
        let info = self
            .accounts
            .remove(account)
            .ok_or(ExecutorError::NotInstalled)?;
        self.signers.remove(&info.signer_address);
        Ok(info)
    }

    /// Undo a change previously made by `register` or `remove`.
    ///
    /// Changes must be undone newest first.
    pub fn revert(&mut self, change: RegistryChange) {
        match change {
            RegistryChange::Registered(account) => {
                if let Some(info) = self.accounts.remove(&account) {
                    self.signers.remove(&info.signer_address);
                }
            }
            RegistryChange::Removed(account, info) => {
                self.signers.insert(info.signer_address, account);
                self.accounts.insert(account, info);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
