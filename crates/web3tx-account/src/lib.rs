//! Account management module for the web3tx signer.
//!
//! This module provides the signing capability of an externally-owned
//! account: its identity on the ledger, its secp256k1 public key, and raw
//! recoverable signatures over 32-byte hashes. Signatures are produced with a
//! raw recovery byte in {0, 1}; converting to the wallet convention is the
//! caller's concern.

use alloy_primitives::{Address, B256};
use bech32::{Bech32, Hrp};
use async_trait::async_trait;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use thiserror::Error;
use web3tx_types::{ConfigSchema, ImplementationRegistry, PubKey};

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

/// Length of a recoverable `r || s || v` signature.
pub const SIGNATURE_LEN: usize = 65;
/// Index of the recovery byte within a signature.
pub const RECOVERY_ID_OFFSET: usize = 64;
/// Offset added to the raw recovery id by Ethereum wallets (yellow paper).
pub const ETH_V_OFFSET: u8 = 27;

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// Error that occurs when signing operations fail.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	/// Error that occurs when a cryptographic key is invalid or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	/// Error that occurs when a signature cannot be parsed or recovered.
	#[error("Invalid signature: {0}")]
	InvalidSignature(String),
	/// Error that occurs when interacting with the account implementation.
	#[error("Implementation error: {0}")]
	Implementation(String),
}

/// Who is signing: immutable for the duration of one signing operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerIdentity {
	/// Bech32 address of the account on the ledger.
	pub ledger_address: String,
	/// Ethereum address derived from the public key.
	pub evm_address: Address,
	/// Compressed secp256k1 public key.
	pub pub_key: PubKey,
}

/// A 65-byte recoverable ECDSA signature, `r || s || v`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature(pub [u8; SIGNATURE_LEN]);

impl RecoverableSignature {
	pub fn v(&self) -> u8 {
		self.0[RECOVERY_ID_OFFSET]
	}

	/// Converts a raw recovery byte (0/1) to the wallet convention (27/28).
	pub fn to_eth_convention(mut self) -> Result<Self, AccountError> {
		match self.v() {
			v @ (0 | 1) => {
				self.0[RECOVERY_ID_OFFSET] = v + ETH_V_OFFSET;
				Ok(self)
			},
			v => Err(AccountError::InvalidSignature(format!(
				"expected raw recovery id 0 or 1, got {}",
				v
			))),
		}
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	pub fn to_vec(&self) -> Vec<u8> {
		self.0.to_vec()
	}
}

impl std::fmt::Debug for RecoverableSignature {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "RecoverableSignature(0x{})", hex::encode(self.0))
	}
}

/// Trait defining the interface for account implementations.
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Returns the configuration schema for this account implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Returns the identity of the signer.
	fn identity(&self) -> SignerIdentity;

	/// Signs a 32-byte prehashed message.
	///
	/// The returned signature carries a raw recovery id in {0, 1}.
	async fn sign_hash(&self, hash: &B256) -> Result<RecoverableSignature, AccountError>;
}

/// Type alias for account factory functions.
pub type AccountFactory = fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>;

/// Registry trait for account implementations.
pub trait AccountRegistry: ImplementationRegistry<Factory = AccountFactory> {}

/// Get all registered account implementations.
pub fn get_all_implementations() -> Vec<(&'static str, AccountFactory)> {
	use implementations::local;

	vec![(local::Registry::NAME, local::Registry::factory())]
}

/// Service wrapping the configured account implementation.
pub struct AccountService {
	implementation: Box<dyn AccountInterface>,
}

impl AccountService {
	pub fn new(implementation: Box<dyn AccountInterface>) -> Self {
		Self { implementation }
	}

	pub fn identity(&self) -> SignerIdentity {
		self.implementation.identity()
	}

	/// Signs a 32-byte hash with the managed account.
	pub async fn sign_hash(&self, hash: &B256) -> Result<RecoverableSignature, AccountError> {
		self.implementation.sign_hash(hash).await
	}
}

/// Encodes the 20 address bytes of an Ethereum key under a bech32 prefix.
///
/// Ethermint-style chains derive both addresses from the same bytes, so
/// `kava1...` and `0x...` name the same account.
pub fn ledger_address(hrp: &str, evm_address: &Address) -> Result<String, AccountError> {
	let hrp = Hrp::parse(hrp)
		.map_err(|e| AccountError::InvalidKey(format!("Invalid address prefix '{}': {}", hrp, e)))?;
	bech32::encode::<Bech32>(hrp, evm_address.as_slice())
		.map_err(|e| AccountError::InvalidKey(format!("Failed to encode address: {}", e)))
}

/// Checks that a bech32 ledger address carries the bytes of `evm_address`.
pub fn check_ledger_address(address: &str, evm_address: &Address) -> Result<(), AccountError> {
	let (_, data) = bech32::decode(address)
		.map_err(|e| AccountError::InvalidKey(format!("Invalid ledger address '{}': {}", address, e)))?;
	if data.as_slice() != evm_address.as_slice() {
		return Err(AccountError::InvalidKey(format!(
			"Ledger address {} does not belong to key {}",
			address, evm_address
		)));
	}
	Ok(())
}

/// Recovers the public key that produced `signature` over `hash`.
///
/// Accepts recovery bytes in either convention (0/1 or 27/28).
pub fn recover_public_key(
	hash: &B256,
	signature: &RecoverableSignature,
) -> Result<VerifyingKey, AccountError> {
	let raw_v = match signature.v() {
		v @ (0 | 1) => v,
		v @ (27 | 28) => v - ETH_V_OFFSET,
		v => {
			return Err(AccountError::InvalidSignature(format!(
				"unsupported recovery byte {}",
				v
			)))
		},
	};
	let recovery_id = RecoveryId::from_byte(raw_v)
		.ok_or_else(|| AccountError::InvalidSignature(format!("bad recovery id {}", raw_v)))?;
	let sig = Signature::from_slice(&signature.0[..RECOVERY_ID_OFFSET])
		.map_err(|e| AccountError::InvalidSignature(e.to_string()))?;

	VerifyingKey::recover_from_prehash(hash.as_slice(), &sig, recovery_id)
		.map_err(|e| AccountError::InvalidSignature(e.to_string()))
}

/// Compressed SEC1 encoding of a public key, as carried in signer infos.
pub fn compressed_pub_key(key: &VerifyingKey) -> PubKey {
	PubKey::eth_secp256k1(key.to_encoded_point(true).as_bytes().to_vec())
}
