//! Ledger account types.
//!
//! The ledger returns accounts as polymorphic records tagged with a type URL.
//! [`AccountRecord`] is that raw shape; [`AccountInfo`] is what the interface
//! registry resolves it into, and [`AccountState`] is the replay-protection
//! pair the signer actually needs.

use serde::{Deserialize, Serialize};

/// Type URL of the ethermint secp256k1 public key.
pub const ETH_SECP256K1_PUBKEY_TYPE_URL: &str = "/ethermint.crypto.v1.ethsecp256k1.PubKey";

/// An account record as returned by the ledger, before type resolution.
///
/// `value` holds the full JSON object including its `@type` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
	/// The registry type URL, e.g. `/cosmos.auth.v1beta1.BaseAccount`.
	pub type_url: String,
	/// The raw account object.
	pub value: serde_json::Value,
}

impl AccountRecord {
	/// Builds a record from a ledger JSON object carrying an `@type` tag.
	///
	/// Returns `None` if the object has no string `@type` field.
	pub fn from_tagged(value: serde_json::Value) -> Option<Self> {
		let type_url = value.get("@type")?.as_str()?.to_string();
		Some(Self { type_url, value })
	}
}

/// Concrete account information after unpacking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
	/// The bech32 ledger address.
	pub address: String,
	/// Ledger-assigned account number.
	pub account_number: u64,
	/// Number of transactions accepted from this account.
	pub sequence: u64,
}

impl AccountInfo {
	/// Returns the replay-protection pair of this account.
	pub fn state(&self) -> AccountState {
		AccountState {
			sequence: self.sequence,
			account_number: self.account_number,
		}
	}
}

/// Sequence and account number of a signer at the time of signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
	pub sequence: u64,
	pub account_number: u64,
}

/// A typed public key as carried in signer infos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PubKey {
	/// Registry type URL of the key.
	pub type_url: String,
	/// Compressed SEC1 key bytes.
	#[serde(with = "crate::utils::serde_hex")]
	pub key: Vec<u8>,
}

impl PubKey {
	/// Wraps a 33-byte compressed secp256k1 key as an ethermint public key.
	pub fn eth_secp256k1(key: Vec<u8>) -> Self {
		Self {
			type_url: ETH_SECP256K1_PUBKEY_TYPE_URL.to_string(),
			key,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_record_from_tagged() {
		let record = AccountRecord::from_tagged(json!({
			"@type": "/cosmos.auth.v1beta1.BaseAccount",
			"account_number": "12",
		}))
		.unwrap();
		assert_eq!(record.type_url, "/cosmos.auth.v1beta1.BaseAccount");

		assert!(AccountRecord::from_tagged(json!({"account_number": "12"})).is_none());
	}

	#[test]
	fn test_account_state() {
		let info = AccountInfo {
			address: "kava1test".to_string(),
			account_number: 12,
			sequence: 5,
		};
		assert_eq!(
			info.state(),
			AccountState {
				sequence: 5,
				account_number: 12
			}
		);
	}
}
