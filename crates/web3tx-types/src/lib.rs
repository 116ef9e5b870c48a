//! Common types module for the web3tx signing system.
//!
//! This module defines the data types shared by every stage of the EIP-712
//! signing pipeline: ledger account records, fees and messages, the chain
//! identifier format, the interface registry used to resolve polymorphic
//! records, and configuration validation helpers.

/// Ledger account records and the resolved account state.
pub mod account;
/// Ledger chain identifier parsing.
pub mod chain_id;
/// EVM module parameters carrying the EIP-712 message layouts.
pub mod evm_params;
/// Type-URL registry for polymorphic accounts and messages.
pub mod interface_registry;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Secure string type for private keys.
pub mod secret_string;
/// Fee, coin and message types of the native ledger transaction.
pub mod tx;
/// Utility functions for hex formatting and EIP-712 encoding.
pub mod utils;
/// Configuration validation types for implementation sections.
pub mod validation;

pub use account::*;
pub use chain_id::{parse_chain_id, ChainIdError, EvmChainId};
pub use evm_params::*;
pub use interface_registry::{AccountDecoder, InterfaceRegistry, MsgCodec, RegistryError};
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use tx::*;
pub use utils::{with_0x_prefix, without_0x_prefix};
pub use validation::*;
