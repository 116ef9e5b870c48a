//! Builder for constructing a signer from configuration.
//!
//! Ledger and account implementations are created through factory functions
//! keyed by the names used in the `implementations` tables; the configured
//! `primary` of each section is the one wired into the signer.

use crate::signer::Eip712TxSigner;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use web3tx_account::{AccountFactory, AccountService};
use web3tx_config::Config;
use web3tx_eip712::TypedDataBuilder;
use web3tx_envelope::TxConfig;
use web3tx_ledger::{LedgerFactory, LedgerService};
use web3tx_types::InterfaceRegistry;

/// Errors that can occur during signer construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions available to the builder, keyed by implementation name.
pub struct SignerFactories {
	pub ledger_factories: HashMap<String, LedgerFactory>,
	pub account_factories: HashMap<String, AccountFactory>,
}

impl Default for SignerFactories {
	/// Every implementation shipped with the ledger and account crates.
	fn default() -> Self {
		Self {
			ledger_factories: web3tx_ledger::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
			account_factories: web3tx_account::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
		}
	}
}

/// Builder for an [`Eip712TxSigner`].
pub struct SignerBuilder {
	config: Config,
	registry: InterfaceRegistry,
}

impl SignerBuilder {
	/// Creates a builder using the default interface registry.
	pub fn new(config: Config) -> Self {
		Self {
			config,
			registry: InterfaceRegistry::with_defaults(),
		}
	}

	/// Replaces the interface registry, e.g. to register additional messages.
	pub fn with_registry(mut self, registry: InterfaceRegistry) -> Self {
		self.registry = registry;
		self
	}

	pub fn build(self, factories: &SignerFactories) -> Result<Eip712TxSigner, BuilderError> {
		let ledger_config = &self.config.ledger;
		let ledger_factory = factories
			.ledger_factories
			.get(&ledger_config.primary)
			.ok_or_else(|| {
				BuilderError::MissingComponent(format!(
					"No ledger implementation named '{}'",
					ledger_config.primary
				))
			})?;
		let ledger_section = ledger_config
			.implementations
			.get(&ledger_config.primary)
			.ok_or_else(|| {
				BuilderError::Config(format!(
					"Primary ledger '{}' has no configuration",
					ledger_config.primary
				))
			})?;
		let ledger_impl = ledger_factory(ledger_section).map_err(|e| {
			tracing::error!(
				component = "ledger",
				implementation = %ledger_config.primary,
				error = %e,
				"Failed to create ledger implementation"
			);
			BuilderError::Config(format!(
				"Failed to create ledger implementation '{}': {}",
				ledger_config.primary, e
			))
		})?;
		tracing::info!(component = "ledger", implementation = %ledger_config.primary, "Loaded");

		let account_config = &self.config.account;
		let account_factory = factories
			.account_factories
			.get(&account_config.primary)
			.ok_or_else(|| {
				BuilderError::MissingComponent(format!(
					"No account implementation named '{}'",
					account_config.primary
				))
			})?;
		let account_section = account_config
			.implementations
			.get(&account_config.primary)
			.ok_or_else(|| {
				BuilderError::Config(format!(
					"Primary account '{}' has no configuration",
					account_config.primary
				))
			})?;
		let account_impl = account_factory(account_section).map_err(|e| {
			tracing::error!(
				component = "account",
				implementation = %account_config.primary,
				error = %e,
				"Failed to create account implementation"
			);
			BuilderError::Config(format!(
				"Failed to create account implementation '{}': {}",
				account_config.primary, e
			))
		})?;
		tracing::info!(component = "account", implementation = %account_config.primary, "Loaded");

		let registry = Arc::new(self.registry);
		let ledger = Arc::new(LedgerService::new(ledger_impl, registry.clone()));
		let account = Arc::new(AccountService::new(account_impl));
		let domain = &self.config.chain.eip712;

		Ok(Eip712TxSigner::new(
			ledger,
			account,
			TxConfig::new(registry),
			TypedDataBuilder::new(&domain.name, &domain.version),
			self.config.chain.chain_id.clone(),
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const CONFIG: &str = r#"
[chain]
chain_id = "kava_2222-10"

[ledger]
primary = "rest"
[ledger.implementations.rest]
url = "http://localhost:1317"

[account]
primary = "local"
[account.implementations.local]
private_key = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
hrp = "kava"
"#;

	#[test]
	fn test_build_from_config() {
		let config: Config = CONFIG.parse().unwrap();
		let signer = SignerBuilder::new(config)
			.build(&SignerFactories::default())
			.unwrap();
		assert_eq!(signer.chain_id(), "kava_2222-10");
		assert_eq!(
			signer.identity().ledger_address,
			"kava17w0adeg64ky0daxwd2ugyuneellmjgnxlg00a8"
		);
	}

	#[test]
	fn test_address_of_another_key_rejected() {
		let config: Config = CONFIG
			.replace(
				"hrp = \"kava\"",
				"address = \"kava1wzvhjux9rqfdcwspp37srdgwp5tac7wghrtsfp\"",
			)
			.parse()
			.unwrap();
		let result = SignerBuilder::new(config).build(&SignerFactories::default());
		assert!(matches!(result, Err(BuilderError::Config(m)) if m.contains("does not belong")));
	}

	#[test]
	fn test_missing_factory() {
		let config: Config = CONFIG.parse().unwrap();
		let factories = SignerFactories {
			ledger_factories: HashMap::new(),
			account_factories: HashMap::new(),
		};
		assert!(matches!(
			SignerBuilder::new(config).build(&factories),
			Err(BuilderError::MissingComponent(_))
		));
	}

	#[test]
	fn test_invalid_implementation_section() {
		let config: Config = CONFIG
			.replace("http://localhost:1317", "localhost:1317")
			.parse()
			.unwrap();
		assert!(matches!(
			SignerBuilder::new(config).build(&SignerFactories::default()),
			Err(BuilderError::Config(_))
		));
	}
}
