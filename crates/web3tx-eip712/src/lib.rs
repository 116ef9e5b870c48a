//! EIP-712 typed data for ledger transactions.
//!
//! This module turns the fields of a native ledger transaction into the
//! typed-data structure an Ethereum wallet signs, and computes the canonical
//! EIP-712 hash of that structure. The layout of each message value is not
//! known here: it comes from an injected [`MsgSchemaProvider`], normally the
//! ledger's EVM parameters.

use thiserror::Error;
use web3tx_types::ChainIdError;

pub mod builder;
pub mod hash;
pub mod schema;
pub mod sign_doc;
pub mod typed_data;

pub use builder::{check_domain_invariant, TxFields, TypedDataBuilder};
pub use hash::{compute_typed_data_hash, encode_type, hash_struct};
pub use schema::{MsgSchema, MsgSchemaProvider, StaticSchemaTable};
pub use sign_doc::StdSignDoc;
pub use typed_data::{Eip712Domain, Eip712Field, TypedData, Types};

/// Errors that can occur while building or hashing typed data.
#[derive(Debug, Error)]
pub enum TypedDataError {
	/// The ledger chain identifier does not follow `{name}_{epoch}-{revision}`.
	#[error("Invalid chain id: {0}")]
	ChainIdParse(#[from] ChainIdError),
	/// A message type has no EIP-712 layout.
	#[error("Unsupported message type: {0}")]
	UnsupportedMessage(String),
	/// The domain carries a value in a field that must stay empty.
	#[error("Domain invariant violated: {0}")]
	DomainInvariant(String),
	/// The typed data cannot be encoded.
	#[error("Hash computation failed: {0}")]
	HashCompute(String),
}
