//! Executor Configuration
//!
//! The two values that bind an operation hash to one deployment:
//! the chain id and the module's own address. Loaded from code, from the
//! environment, or from JSON, and validated before a module is built.

use crate::error::{PkpError, PkpResult};
use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::env;

pub const ENV_CHAIN_ID: &str = "PKP_EXECUTOR_CHAIN_ID";
pub const ENV_MODULE_ADDRESS: &str = "PKP_EXECUTOR_MODULE_ADDRESS";
pub const ENV_DEBUG: &str = "PKP_EXECUTOR_DEBUG";

/// EVM chain ids the module is commonly deployed on
pub mod chain_ids {
    // Mainnet chains
    pub const ETHEREUM: u64 = 1;
    pub const OPTIMISM: u64 = 10;
    pub const POLYGON: u64 = 137;
    pub const BASE: u64 = 8453;
    pub const ARBITRUM: u64 = 42161;
    pub const CHRONICLE_YELLOWSTONE: u64 = 175188;

    // Testnet chains
    pub const SEPOLIA: u64 = 11155111;
    pub const BASE_SEPOLIA: u64 = 84532;
    pub const ARBITRUM_SEPOLIA: u64 = 421614;
    pub const OPTIMISM_SEPOLIA: u64 = 11155420;
}

/// Deployment settings for one executor module instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorConfig {
    /// Chain the module is deployed on
    pub chain_id: u64,
    /// Address the module is deployed at
    pub module_address: Address,
    /// Emit debug-level log lines
    #[serde(default)]
    pub debug_logging: bool,
}

impl ExecutorConfig {
    pub fn new(chain_id: u64, module_address: Address) -> Self {
        Self {
            chain_id,
            module_address,
            debug_logging: false,
        }
    }

    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging = enabled;
        self
    }

    /// Load from `PKP_EXECUTOR_*` environment variables
    pub fn from_env() -> PkpResult<Self> {
        let chain_id = env::var(ENV_CHAIN_ID)
            .map_err(|_| PkpError::config_error(format!("{} is not set", ENV_CHAIN_ID)))?;
        let module_address = env::var(ENV_MODULE_ADDRESS)
            .map_err(|_| PkpError::config_error(format!("{} is not set", ENV_MODULE_ADDRESS)))?;
        let debug = env::var(ENV_DEBUG).unwrap_or_default();

        Self::from_parts(&chain_id, &module_address, &debug)
    }

    /// Build from raw string values, as read from the environment
    pub fn from_parts(chain_id: &str, module_address: &str, debug: &str) -> PkpResult<Self> {
        let chain_id: u64 = chain_id.trim().parse().map_err(|_| {
            PkpError::config_error(format!("Invalid chain id: {}", chain_id))
        })?;
        let module_address: Address = module_address.parse()?;
        let debug_logging = matches!(debug.trim().to_lowercase().as_str(), "1" | "true" | "yes");

        let config = Self {
            chain_id,
            module_address,
            debug_logging,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document
    pub fn from_json(json: &str) -> PkpResult<Self> {
        let config: ExecutorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PkpResult<()> {
        if self.chain_id == 0 {
            return Err(PkpError::config_error("Chain id must be non-zero"));
        }
        if self.module_address.is_zero() {
            return Err(PkpError::config_error("Module address must be non-zero"));
        }
        Ok(())
    }

    pub fn is_testnet(&self) -> bool {
        matches!(
            self.chain_id,
            chain_ids::SEPOLIA
                | chain_ids::BASE_SEPOLIA
                | chain_ids::ARBITRUM_SEPOLIA
                | chain_ids::OPTIMISM_SEPOLIA
        )
    }
}
