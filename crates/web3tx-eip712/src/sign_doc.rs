//! Legacy amino-JSON sign document.
//!
//! This is the untyped payload the typed-data message is derived from. Every
//! integer in it is rendered as a decimal string.

use serde_json::{json, Map, Value};
use web3tx_types::{LedgerMsg, StdFee};

/// The untyped transaction payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StdSignDoc {
	pub account_number: u64,
	pub chain_id: String,
	pub fee: StdFee,
	pub memo: String,
	pub msgs: Vec<Value>,
	pub sequence: u64,
	/// Omitted from the rendering when zero.
	pub timeout_height: u64,
}

impl StdSignDoc {
	pub fn new(
		chain_id: &str,
		account_number: u64,
		sequence: u64,
		timeout_height: u64,
		fee: &StdFee,
		msgs: &[LedgerMsg],
		memo: &str,
	) -> Self {
		Self {
			account_number,
			chain_id: chain_id.to_string(),
			fee: fee.clone(),
			memo: memo.to_string(),
			msgs: msgs.iter().map(LedgerMsg::amino_json).collect(),
			sequence,
			timeout_height,
		}
	}

	/// Renders the fee as `{"amount": [...], "gas": "<n>"}`.
	pub fn fee_json(&self) -> Value {
		let amount: Vec<Value> = self
			.fee
			.amount
			.iter()
			.map(|coin| json!({"amount": coin.amount, "denom": coin.denom}))
			.collect();
		json!({
			"amount": amount,
			"gas": self.fee.gas.to_string(),
		})
	}

	/// Renders the document as a JSON object.
	pub fn to_json(&self) -> Value {
		let mut doc = Map::new();
		doc.insert(
			"account_number".into(),
			Value::String(self.account_number.to_string()),
		);
		doc.insert("chain_id".into(), Value::String(self.chain_id.clone()));
		doc.insert("fee".into(), self.fee_json());
		doc.insert("memo".into(), Value::String(self.memo.clone()));
		doc.insert("msgs".into(), Value::Array(self.msgs.clone()));
		doc.insert("sequence".into(), Value::String(self.sequence.to_string()));
		if self.timeout_height != 0 {
			doc.insert(
				"timeout_height".into(),
				Value::String(self.timeout_height.to_string()),
			);
		}
		Value::Object(doc)
	}
}
