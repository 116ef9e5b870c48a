//! EVM module parameters relevant to EIP-712 signing.
//!
//! The ledger publishes, per allowed message type, the EIP-712 struct layout
//! its amino-JSON value must be presented under. Only the fields needed to
//! build typed data are kept; everything else in the params object is ignored.

use serde::{Deserialize, Serialize};

/// EVM module parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmParams {
	/// Denomination of the EVM gas token.
	#[serde(default)]
	pub evm_denom: String,
	/// Message types that may be signed through EIP-712, with their layouts.
	#[serde(default)]
	pub eip712_allowed_msgs: Vec<Eip712AllowedMsg>,
}

impl EvmParams {
	/// Finds the layout registered for a message type URL.
	pub fn allowed_msg(&self, type_url: &str) -> Option<&Eip712AllowedMsg> {
		self.eip712_allowed_msgs
			.iter()
			.find(|msg| msg.msg_type_url == type_url)
	}
}

/// EIP-712 layout of one message type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eip712AllowedMsg {
	/// Registry type URL, e.g. `/cosmos.bank.v1beta1.MsgSend`.
	pub msg_type_url: String,
	/// Struct name the message value is typed as, e.g. `MsgValueSend`.
	pub msg_value_type_name: String,
	/// Fields of the value struct.
	#[serde(default)]
	pub value_types: Vec<Eip712MsgAttrType>,
	/// Structs referenced from the value struct.
	#[serde(default)]
	pub nested_types: Vec<Eip712NestedMsgType>,
}

/// A single `name: type` field of an EIP-712 struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eip712MsgAttrType {
	pub name: String,
	#[serde(rename = "type")]
	pub r#type: String,
}

impl Eip712MsgAttrType {
	pub fn new(name: impl Into<String>, r#type: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			r#type: r#type.into(),
		}
	}
}

/// A struct referenced from a message value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eip712NestedMsgType {
	pub name: String,
	#[serde(default)]
	pub attrs: Vec<Eip712MsgAttrType>,
}
