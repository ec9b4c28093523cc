//! The forwarded-call boundary
//!
//! The module never knows what a target does. It hands a `ForwardedCall`
//! to a `CallForwarder` (the chain, a test harness, a simulator) and only
//! looks at success or failure. The forwarder gets the module back so a
//! target can call into it again, which is how reentrancy is exercised.

use super::module::ExecutorModule;
use crate::abi::U256;
use crate::types::Address;
use serde::{Deserialize, Serialize};

/// One call the module performs on behalf of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardedCall {
    /// The executor module making the call
    pub module: Address,
    /// Account the call is made for
    pub account: Address,
    pub target: Address,
    pub value: U256,
    #[serde(with = "crate::serde_bytes::hex_vec")]
    pub data: Vec<u8>,
}

/// A forwarded call that reverted
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFailure {
    #[serde(with = "crate::serde_bytes::hex_vec")]
    pub revert_data: Vec<u8>,
}

impl CallFailure {
    pub fn new(revert_data: impl Into<Vec<u8>>) -> Self {
        Self {
            revert_data: revert_data.into(),
        }
    }
}

/// Performs forwarded calls
pub trait CallForwarder {
    /// Run `call` exactly once and return its return data
    fn forward(&mut self, module: &ExecutorModule, call: &ForwardedCall) -> Result<Vec<u8>, CallFailure>;
}

impl<F> CallForwarder for F
where
    F: FnMut(&ExecutorModule, &ForwardedCall) -> Result<Vec<u8>, CallFailure>,
{
    fn forward(&mut self, module: &ExecutorModule, call: &ForwardedCall) -> Result<Vec<u8>, CallFailure> {
        self(module, call)
    }
}

/// Forwarder that records every call and answers with a fixed outcome
#[derive(Debug, Clone)]
pub struct RecordingForwarder {
    calls: Vec<ForwardedCall>,
    outcome: Result<Vec<u8>, CallFailure>,
}

impl RecordingForwarder {
    /// Every call succeeds with `return_data`
    pub fn succeeding(return_data: impl Into<Vec<u8>>) -> Self {
        Self {
            calls: Vec::new(),
            outcome: Ok(return_data.into()),
        }
    }

    /// Every call reverts with `revert_data`
    pub fn failing(revert_data: impl Into<Vec<u8>>) -> Self {
        Self {
            calls: Vec::new(),
            outcome: Err(CallFailure::new(revert_data)),
        }
    }

    pub fn calls(&self) -> &[ForwardedCall] {
        &self.calls
    }
}

impl Default for RecordingForwarder {
    fn default() -> Self {
        Self::succeeding(Vec::new())
    }
}

impl CallForwarder for RecordingForwarder {
    fn forward(&mut self, _module: &ExecutorModule, call: &ForwardedCall) -> Result<Vec<u8>, CallFailure> {
        self.calls.push(call.clone());
        self.outcome.clone()
    }
}
