//! Native ledger transaction building blocks.
//!
//! These are the fields that end up both in the EIP-712 typed data and in the
//! native envelope, so every type here is compared byte-for-byte across the
//! two representations.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A single-denomination amount.
///
/// The amount is a base-10 integer string and is never converted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
	pub denom: String,
	pub amount: String,
}

impl Coin {
	pub fn new(amount: impl ToString, denom: impl Into<String>) -> Self {
		Self {
			denom: denom.into(),
			amount: amount.to_string(),
		}
	}
}

/// Legacy fee descriptor: gas limit plus a multi-denomination amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdFee {
	pub amount: Vec<Coin>,
	pub gas: u64,
}

impl StdFee {
	pub fn new(gas: u64, amount: Vec<Coin>) -> Self {
		Self { amount, gas }
	}
}

/// A ledger-native message.
///
/// `type_url` selects the registry codec used to pack the message into the
/// envelope; `amino_type` and `value` form its legacy JSON rendering which is
/// what the signer sees in the typed data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerMsg {
	pub type_url: String,
	pub amino_type: String,
	pub value: Value,
}

impl LedgerMsg {
	pub fn new(type_url: impl Into<String>, amino_type: impl Into<String>, value: Value) -> Self {
		Self {
			type_url: type_url.into(),
			amino_type: amino_type.into(),
			value,
		}
	}

	/// Returns the legacy `{"type", "value"}` JSON form of the message.
	pub fn amino_json(&self) -> Value {
		json!({
			"type": self.amino_type,
			"value": self.value,
		})
	}
}

/// A packed polymorphic value: type URL plus encoded bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Any {
	pub type_url: String,
	#[serde(with = "crate::utils::serde_hex")]
	pub value: Vec<u8>,
}
