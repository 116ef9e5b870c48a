//! Local private-key account.
//!
//! Holds a secp256k1 key in process memory, loaded from the
//! `[account.implementations.local]` section:
//!
//! ```toml
//! private_key = "0x..."
//! hrp = "kava"
//! ```
//!
//! The ledger address is derived from the key under `hrp`. An explicit
//! `address` may be given instead and must belong to the key.

use crate::{
	check_ledger_address, compressed_pub_key, ledger_address, AccountError, AccountFactory,
	AccountInterface, AccountRegistry, RecoverableSignature, SignerIdentity, RECOVERY_ID_OFFSET,
	SIGNATURE_LEN,
};
use alloy_primitives::B256;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use std::str::FromStr;
use web3tx_types::{
	without_0x_prefix, ConfigSchema, Field, FieldType, ImplementationRegistry, Schema,
	SecretString, ValidationError,
};

/// Account backed by a private key held in memory.
pub struct LocalWallet {
	signer: PrivateKeySigner,
	identity: SignerIdentity,
}

impl LocalWallet {
	/// Creates a wallet whose ledger address is derived from the key under `hrp`.
	pub fn new(private_key: &SecretString, hrp: &str) -> Result<Self, AccountError> {
		let signer = parse_key(private_key)?;
		let address = ledger_address(hrp, &signer.address())?;
		Ok(Self::from_parts(signer, address))
	}

	/// Creates a wallet for an explicit ledger address, which must belong to the key.
	pub fn with_address(private_key: &SecretString, address: &str) -> Result<Self, AccountError> {
		let signer = parse_key(private_key)?;
		check_ledger_address(address, &signer.address())?;
		Ok(Self::from_parts(signer, address.to_string()))
	}

	fn from_parts(signer: PrivateKeySigner, ledger_address: String) -> Self {
		let identity = SignerIdentity {
			ledger_address,
			evm_address: signer.address(),
			pub_key: compressed_pub_key(signer.credential().verifying_key()),
		};
		Self { signer, identity }
	}
}

fn parse_key(private_key: &SecretString) -> Result<PrivateKeySigner, AccountError> {
	private_key
		.with_exposed(|key| PrivateKeySigner::from_str(without_0x_prefix(key)))
		.map_err(|e| AccountError::InvalidKey(format!("Invalid private key: {}", e)))
}

#[async_trait]
impl AccountInterface for LocalWallet {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(LocalWalletSchema)
	}

	fn identity(&self) -> SignerIdentity {
		self.identity.clone()
	}

	async fn sign_hash(&self, hash: &B256) -> Result<RecoverableSignature, AccountError> {
		let (signature, recovery_id) = self
			.signer
			.credential()
			.sign_prehash_recoverable(hash.as_slice())
			.map_err(|e| AccountError::SigningFailed(e.to_string()))?;

		let mut bytes = [0u8; SIGNATURE_LEN];
		bytes[..RECOVERY_ID_OFFSET].copy_from_slice(&signature.to_bytes());
		bytes[RECOVERY_ID_OFFSET] = recovery_id.to_byte();

		tracing::debug!(
			signer = %self.identity.evm_address,
			hash = %hash,
			"Signed prehashed message"
		);
		Ok(RecoverableSignature(bytes))
	}
}

/// Configuration schema for the local wallet.
pub struct LocalWalletSchema;

impl LocalWalletSchema {
	/// Static validation method for use before instance creation
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		LocalWalletSchema.validate(config)
	}
}

impl ConfigSchema for LocalWalletSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![
				Field::new("private_key", FieldType::String).with_validator(|value| {
					let key = value.as_str().map(without_0x_prefix).unwrap_or_default();
					if key.len() != 64 {
						return Err("Private key must be 64 hex characters (32 bytes)".to_string());
					}
					if hex::decode(key).is_err() {
						return Err("Private key must be valid hex".to_string());
					}
					Ok(())
				}),
			],
			vec![
				Field::new("address", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(address) if !address.trim().is_empty() => Ok(()),
						_ => Err("Ledger address cannot be empty".to_string()),
					}
				}),
				Field::new("hrp", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(hrp) if !hrp.trim().is_empty() => Ok(()),
						_ => Err("Address prefix cannot be empty".to_string()),
					}
				}),
			],
		);
		schema.validate(config)?;

		if config.get("address").is_none() && config.get("hrp").is_none() {
			return Err(ValidationError::MissingField("address or hrp".to_string()));
		}
		Ok(())
	}
}

/// Factory function to create a local wallet from configuration.
///
/// Configuration parameters:
/// - `private_key`: hex private key, with or without 0x prefix
/// - `hrp`: bech32 prefix the ledger address is derived under
/// - `address`: explicit bech32 ledger address, checked against the key
pub fn create_account(config: &toml::Value) -> Result<Box<dyn AccountInterface>, AccountError> {
	LocalWalletSchema::validate_config(config)
		.map_err(|e| AccountError::InvalidKey(format!("Invalid configuration: {}", e)))?;

	let private_key = config
		.get("private_key")
		.and_then(|v| v.as_str())
		.map(SecretString::from)
		.ok_or_else(|| AccountError::InvalidKey("private_key is required".into()))?;

	let wallet = match (
		config.get("address").and_then(|v| v.as_str()),
		config.get("hrp").and_then(|v| v.as_str()),
	) {
		(Some(address), _) => LocalWallet::with_address(&private_key, address)?,
		(None, Some(hrp)) => LocalWallet::new(&private_key, hrp)?,
		(None, None) => {
			return Err(AccountError::InvalidKey("address or hrp is required".into()))
		},
	};
	Ok(Box::new(wallet))
}

/// Registry for the local account implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "local";
	type Factory = AccountFactory;

	fn factory() -> Self::Factory {
		create_account
	}
}

impl AccountRegistry for Registry {}
