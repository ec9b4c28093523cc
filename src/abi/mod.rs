//! ABI (Application Binary Interface) module for Solidity/EVM contracts
//!
//! The subset the executor module speaks:
//! - `uint256`, `address`, `bool`, `bytes32`, `bytes` and tuples
//! - Function call encoding and argument decoding
//! - Function selector and event topic calculation

pub mod decoder;
pub mod encoder;
pub mod selector;
pub mod types;
pub mod uint;


pub use decoder::*;
pub use encoder::*;
pub use selector::*;
pub use types::*;
pub use uint::U256;
