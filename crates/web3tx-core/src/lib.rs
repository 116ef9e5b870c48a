//! Core signing pipeline for the web3tx signer.
//!
//! This module ties the components together: it resolves the signer's account
//! state and the ledger's EVM parameters, builds and hashes the EIP-712 typed
//! data, signs it with the configured account, and assembles the native
//! envelope. Every component error is mapped onto [`SignError`]; any failure
//! aborts the whole operation.

use thiserror::Error;
use web3tx_account::AccountError;
use web3tx_eip712::TypedDataError;
use web3tx_envelope::EnvelopeError;
use web3tx_ledger::LedgerError;

pub mod builder;
pub mod signer;

pub use builder::{BuilderError, SignerBuilder, SignerFactories};
pub use signer::{Eip712TxSigner, PreparedTx, SignRequest, SignedEnvelope};

/// Errors that can occur while producing a signed envelope.
#[derive(Debug, Error)]
pub enum SignError {
	/// The ledger could not be reached or refused the query.
	#[error("Query failed: {0}")]
	Query(String),
	/// A ledger response could not be decoded.
	#[error("Decode failed: {0}")]
	Decode(String),
	/// The configured chain identifier is malformed.
	#[error("Chain id parse failed: {0}")]
	ChainIdParse(String),
	/// A message type has no EIP-712 layout.
	#[error("Unsupported message: {0}")]
	UnsupportedMessage(String),
	/// The typed-data domain carries a verifying contract or salt.
	#[error("Domain invariant violated: {0}")]
	DomainInvariant(String),
	/// The typed data could not be hashed.
	#[error("Hash computation failed: {0}")]
	HashCompute(String),
	/// The account failed to sign.
	#[error("Signing failed: {0}")]
	Signing(String),
	/// The transaction builder lacks the extension-option capability.
	#[error("Unsupported builder: {0}")]
	UnsupportedBuilder(String),
	/// The builder rejected the signature slot.
	#[error("Signature slot rejected: {0}")]
	SignatureSlot(String),
	/// A message could not be packed into the envelope.
	#[error("Message pack failed: {0}")]
	MessagePack(String),
}

impl From<LedgerError> for SignError {
	fn from(err: LedgerError) -> Self {
		if err.is_query_failure() {
			SignError::Query(err.to_string())
		} else {
			SignError::Decode(err.to_string())
		}
	}
}

impl From<TypedDataError> for SignError {
	fn from(err: TypedDataError) -> Self {
		match err {
			TypedDataError::ChainIdParse(e) => SignError::ChainIdParse(e.to_string()),
			TypedDataError::UnsupportedMessage(m) => SignError::UnsupportedMessage(m),
			TypedDataError::DomainInvariant(m) => SignError::DomainInvariant(m),
			TypedDataError::HashCompute(m) => SignError::HashCompute(m),
		}
	}
}

impl From<AccountError> for SignError {
	fn from(err: AccountError) -> Self {
		SignError::Signing(err.to_string())
	}
}

impl From<EnvelopeError> for SignError {
	fn from(err: EnvelopeError) -> Self {
		match err {
			EnvelopeError::UnsupportedBuilder(m) => SignError::UnsupportedBuilder(m),
			EnvelopeError::SignatureSlot(m) => SignError::SignatureSlot(m),
			EnvelopeError::MessagePack(m) => SignError::MessagePack(m),
		}
	}
}
