//! Ledger query module for the web3tx signer.
//!
//! This module resolves the state a signer needs before it can sign: the
//! account's sequence and account number, and the EVM parameters that carry
//! the EIP-712 layouts of allowed messages. Query implementations only fetch
//! raw records; resolving the polymorphic account record into concrete
//! account information goes through the interface registry.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use web3tx_types::{
	AccountInfo, AccountRecord, AccountState, ConfigSchema, EvmParams, ImplementationRegistry,
	InterfaceRegistry, RegistryError,
};

/// Re-export implementations
pub mod implementations {
	pub mod rest;
}

/// Errors that can occur during ledger queries.
#[derive(Debug, Error)]
pub enum LedgerError {
	/// Error that occurs during network communication, including non-success responses.
	#[error("Network error: {0}")]
	Network(String),
	/// Error that occurs when a query cannot be formed from its inputs.
	#[error("Invalid request: {0}")]
	InvalidRequest(String),
	/// Error that occurs when a response does not have the expected shape.
	#[error("Decode error: {0}")]
	Decode(String),
	/// Error that occurs when an account record cannot be resolved.
	#[error("Registry error: {0}")]
	Registry(#[from] RegistryError),
}

impl LedgerError {
	/// Whether the failure happened reaching the ledger rather than reading its answer.
	pub fn is_query_failure(&self) -> bool {
		matches!(self, LedgerError::Network(_) | LedgerError::InvalidRequest(_))
	}
}

/// Trait defining the interface for ledger query implementations.
#[async_trait]
pub trait LedgerQueryInterface: Send + Sync {
	/// Returns the configuration schema for this ledger implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Fetches the raw account record of `address`.
	async fn account(&self, address: &str) -> Result<AccountRecord, LedgerError>;

	/// Fetches the current EVM module parameters.
	async fn evm_params(&self) -> Result<EvmParams, LedgerError>;
}

/// Type alias for ledger factory functions.
pub type LedgerFactory = fn(&toml::Value) -> Result<Box<dyn LedgerQueryInterface>, LedgerError>;

/// Registry trait for ledger implementations.
pub trait LedgerRegistry: ImplementationRegistry<Factory = LedgerFactory> {}

/// Get all registered ledger implementations.
pub fn get_all_implementations() -> Vec<(&'static str, LedgerFactory)> {
	use implementations::rest;

	vec![(rest::Registry::NAME, rest::Registry::factory())]
}

/// Service resolving account state and EVM parameters from the ledger.
pub struct LedgerService {
	implementation: Box<dyn LedgerQueryInterface>,
	registry: Arc<InterfaceRegistry>,
}

impl LedgerService {
	pub fn new(implementation: Box<dyn LedgerQueryInterface>, registry: Arc<InterfaceRegistry>) -> Self {
		Self {
			implementation,
			registry,
		}
	}

	/// Fetches and unpacks the account record of `address`.
	pub async fn account_info(&self, address: &str) -> Result<AccountInfo, LedgerError> {
		let record = self.implementation.account(address).await?;
		let info = self.registry.unpack_account(&record)?;

		if info.address != address {
			tracing::warn!(
				requested = %address,
				returned = %info.address,
				"Ledger returned an account for a different address"
			);
		}
		tracing::debug!(
			address = %address,
			account_type = %record.type_url,
			account_number = info.account_number,
			sequence = info.sequence,
			"Resolved account"
		);
		Ok(info)
	}

	/// Returns the sequence and account number of `address`.
	///
	/// Queried fresh on every call; nothing is cached.
	pub async fn account_state(&self, address: &str) -> Result<AccountState, LedgerError> {
		Ok(self.account_info(address).await?.state())
	}

	/// Returns the current EVM module parameters.
	pub async fn evm_params(&self) -> Result<EvmParams, LedgerError> {
		self.implementation.evm_params().await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::{json, Value};
	use web3tx_types::{Schema, ValidationError};

	struct StaticLedger {
		account: Option<Value>,
	}

	struct NoSchema;

	impl ConfigSchema for NoSchema {
		fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
			Schema::new(vec![], vec![]).validate(config)
		}
	}

	#[async_trait]
	impl LedgerQueryInterface for StaticLedger {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(NoSchema)
		}

		async fn account(&self, address: &str) -> Result<AccountRecord, LedgerError> {
			let value = self
				.account
				.clone()
				.ok_or_else(|| LedgerError::Network(format!("account {} not found", address)))?;
			AccountRecord::from_tagged(value)
				.ok_or_else(|| LedgerError::Decode("missing @type".into()))
		}

		async fn evm_params(&self) -> Result<EvmParams, LedgerError> {
			Ok(EvmParams::default())
		}
	}

	fn service(account: Option<Value>) -> LedgerService {
		LedgerService::new(
			Box::new(StaticLedger { account }),
			Arc::new(InterfaceRegistry::with_defaults()),
		)
	}

	#[tokio::test]
	async fn test_account_state() {
		let service = service(Some(json!({
			"@type": "/ethermint.types.v1.EthAccount",
			"base_account": {
				"address": "kava1signer",
				"account_number": "12",
				"sequence": "5",
			},
			"code_hash": "0x00",
		})));

		let state = service.account_state("kava1signer").await.unwrap();
		assert_eq!(state.sequence, 5);
		assert_eq!(state.account_number, 12);
	}

	#[tokio::test]
	async fn test_unknown_account_type_is_decode_failure() {
		let service = service(Some(json!({"@type": "/custom.Account", "address": "kava1x"})));

		let err = service.account_state("kava1x").await.unwrap_err();
		assert!(matches!(err, LedgerError::Registry(RegistryError::UnknownType(_))));
		assert!(!err.is_query_failure());
	}

	#[tokio::test]
	async fn test_query_failure_propagates() {
		let err = service(None).account_state("kava1x").await.unwrap_err();
		assert!(err.is_query_failure());
	}
}
