//! Typed-data structure in the JSON layout wallets accept for
//! `eth_signTypedData_v4`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use web3tx_types::EvmChainId;

/// Struct definitions keyed by type name.
pub type Types = BTreeMap<String, Vec<Eip712Field>>;

/// Name of the domain struct.
pub const DOMAIN_TYPE_NAME: &str = "EIP712Domain";

/// One `name: type` member of a struct definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eip712Field {
	pub name: String,
	#[serde(rename = "type")]
	pub r#type: String,
}

impl Eip712Field {
	pub fn new(name: impl Into<String>, r#type: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			r#type: r#type.into(),
		}
	}
}

/// Domain of the signature.
///
/// `verifying_contract` and `salt` are string-typed and always empty: there is
/// no contract verifying the signature, the ledger's ante handler does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Domain {
	pub name: String,
	pub version: String,
	pub chain_id: EvmChainId,
	pub verifying_contract: String,
	pub salt: String,
}

impl Eip712Domain {
	/// Creates a domain with empty verifying contract and salt.
	pub fn new(name: impl Into<String>, version: impl Into<String>, chain_id: EvmChainId) -> Self {
		Self {
			name: name.into(),
			version: version.into(),
			chain_id,
			verifying_contract: String::new(),
			salt: String::new(),
		}
	}

	/// Struct definition of the domain.
	pub fn fields() -> Vec<Eip712Field> {
		vec![
			Eip712Field::new("name", "string"),
			Eip712Field::new("version", "string"),
			Eip712Field::new("chainId", "uint256"),
			Eip712Field::new("verifyingContract", "string"),
			Eip712Field::new("salt", "string"),
		]
	}

	/// The domain as a JSON object keyed by its field names.
	pub fn to_value(&self) -> Value {
		json!({
			"name": self.name,
			"version": self.version,
			"chainId": self.chain_id,
			"verifyingContract": self.verifying_contract,
			"salt": self.salt,
		})
	}
}

/// A complete typed-data payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedData {
	pub types: Types,
	pub primary_type: String,
	pub domain: Eip712Domain,
	pub message: Value,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_wallet_json_layout() {
		let mut types = Types::new();
		types.insert(DOMAIN_TYPE_NAME.to_string(), Eip712Domain::fields());
		let typed_data = TypedData {
			types,
			primary_type: "Tx".to_string(),
			domain: Eip712Domain::new("Kava Cosmos", "1.0.0", 2222),
			message: json!({}),
		};

		let value = serde_json::to_value(&typed_data).unwrap();
		assert_eq!(value["primaryType"], "Tx");
		assert_eq!(value["domain"]["chainId"], 2222);
		assert_eq!(value["domain"]["verifyingContract"], "");
		assert_eq!(value["types"]["EIP712Domain"][2]["type"], "uint256");
		assert_eq!(value["domain"], typed_data.domain.to_value());
	}
}
