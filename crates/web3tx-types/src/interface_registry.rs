//! Type-URL registry for polymorphic ledger values.
//!
//! Accounts and messages travel as type-URL tagged values. The registry maps
//! each known type URL to a decoder (accounts) or a codec (messages) and
//! resolves values into concrete types, returning a discriminated error when
//! the type is unknown or the payload does not match it.

use crate::{AccountInfo, AccountRecord, Any, LedgerMsg};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Decodes a raw account object of one registered type.
pub type AccountDecoder = fn(&Value) -> Result<AccountInfo, String>;

/// Errors that can occur while resolving registered types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
	#[error("No type registered for type URL '{0}'")]
	UnknownType(String),
	#[error("Failed to decode '{type_url}': {reason}")]
	Decode { type_url: String, reason: String },
	#[error("Failed to encode '{type_url}': {reason}")]
	Encode { type_url: String, reason: String },
	#[error("Amino type '{actual}' does not match '{expected}' registered for '{type_url}'")]
	AminoMismatch {
		type_url: String,
		expected: String,
		actual: String,
	},
}

/// Wire codec of one message type.
#[derive(Debug, Clone, Copy)]
pub struct MsgCodec {
	pub encode: fn(&Value) -> Result<Vec<u8>, String>,
	pub decode: fn(&[u8]) -> Result<Value, String>,
}

impl MsgCodec {
	/// Codec storing the canonical (key-sorted) JSON bytes of the message value.
	pub fn json() -> Self {
		Self {
			encode: |value| serde_json::to_vec(value).map_err(|e| e.to_string()),
			decode: |bytes| serde_json::from_slice(bytes).map_err(|e| e.to_string()),
		}
	}
}

#[derive(Debug, Clone)]
struct MsgEntry {
	amino_type: String,
	codec: MsgCodec,
}

/// Registry of account decoders and message codecs keyed by type URL.
#[derive(Debug, Clone, Default)]
pub struct InterfaceRegistry {
	accounts: HashMap<String, AccountDecoder>,
	msgs: HashMap<String, MsgEntry>,
}

/// Account types understood out of the box.
const DEFAULT_ACCOUNTS: &[(&str, AccountDecoder)] = &[
	("/cosmos.auth.v1beta1.BaseAccount", decode_base_account),
	("/cosmos.auth.v1beta1.ModuleAccount", decode_wrapped_base_account),
	("/ethermint.types.v1.EthAccount", decode_wrapped_base_account),
	("/cosmos.vesting.v1beta1.BaseVestingAccount", decode_wrapped_base_account),
	("/cosmos.vesting.v1beta1.ContinuousVestingAccount", decode_vesting_account),
	("/cosmos.vesting.v1beta1.DelayedVestingAccount", decode_vesting_account),
	("/cosmos.vesting.v1beta1.PeriodicVestingAccount", decode_vesting_account),
];

/// Message types understood out of the box, with their legacy amino names.
const DEFAULT_MSGS: &[(&str, &str)] = &[
	("/cosmos.bank.v1beta1.MsgSend", "cosmos-sdk/MsgSend"),
	("/cosmos.bank.v1beta1.MsgMultiSend", "cosmos-sdk/MsgMultiSend"),
	("/cosmos.staking.v1beta1.MsgDelegate", "cosmos-sdk/MsgDelegate"),
	("/cosmos.staking.v1beta1.MsgUndelegate", "cosmos-sdk/MsgUndelegate"),
	(
		"/cosmos.staking.v1beta1.MsgBeginRedelegate",
		"cosmos-sdk/MsgBeginRedelegate",
	),
	(
		"/cosmos.distribution.v1beta1.MsgWithdrawDelegatorReward",
		"cosmos-sdk/MsgWithdrawDelegationReward",
	),
	("/cosmos.gov.v1beta1.MsgVote", "cosmos-sdk/MsgVote"),
];

impl InterfaceRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a registry with the standard account types and the common
	/// bank, staking, distribution and gov messages (JSON codec).
	pub fn with_defaults() -> Self {
		let mut registry = Self::new();
		for (type_url, decoder) in DEFAULT_ACCOUNTS {
			registry.register_account(type_url, *decoder);
		}
		for (type_url, amino_type) in DEFAULT_MSGS {
			registry.register_msg(type_url, amino_type, MsgCodec::json());
		}
		registry
	}

	pub fn register_account(&mut self, type_url: &str, decoder: AccountDecoder) {
		self.accounts.insert(type_url.to_string(), decoder);
	}

	pub fn register_msg(&mut self, type_url: &str, amino_type: &str, codec: MsgCodec) {
		self.msgs.insert(
			type_url.to_string(),
			MsgEntry {
				amino_type: amino_type.to_string(),
				codec,
			},
		);
	}

	/// Checks that a message's type URL is registered and that its amino name
	/// is the one registered for it.
	///
	/// The typed data shows the caller's amino name while the envelope is
	/// decoded with the registered one, so the two must agree.
	pub fn check_msg(&self, msg: &LedgerMsg) -> Result<(), RegistryError> {
		let entry = self
			.msgs
			.get(&msg.type_url)
			.ok_or_else(|| RegistryError::UnknownType(msg.type_url.clone()))?;
		if entry.amino_type != msg.amino_type {
			return Err(RegistryError::AminoMismatch {
				type_url: msg.type_url.clone(),
				expected: entry.amino_type.clone(),
				actual: msg.amino_type.clone(),
			});
		}
		Ok(())
	}

	/// Resolves a tagged account record into concrete account information.
	pub fn unpack_account(&self, record: &AccountRecord) -> Result<AccountInfo, RegistryError> {
		let decoder = self
			.accounts
			.get(&record.type_url)
			.ok_or_else(|| RegistryError::UnknownType(record.type_url.clone()))?;
		decoder(&record.value).map_err(|reason| RegistryError::Decode {
			type_url: record.type_url.clone(),
			reason,
		})
	}

	/// Packs a message into its polymorphic envelope form.
	pub fn pack_msg(&self, msg: &LedgerMsg) -> Result<Any, RegistryError> {
		let entry = self
			.msgs
			.get(&msg.type_url)
			.ok_or_else(|| RegistryError::UnknownType(msg.type_url.clone()))?;
		let value = (entry.codec.encode)(&msg.value).map_err(|reason| RegistryError::Encode {
			type_url: msg.type_url.clone(),
			reason,
		})?;
		Ok(Any {
			type_url: msg.type_url.clone(),
			value,
		})
	}

	/// Unpacks a packed message back into its ledger form.
	pub fn unpack_msg(&self, any: &Any) -> Result<LedgerMsg, RegistryError> {
		let entry = self
			.msgs
			.get(&any.type_url)
			.ok_or_else(|| RegistryError::UnknownType(any.type_url.clone()))?;
		let value = (entry.codec.decode)(&any.value).map_err(|reason| RegistryError::Decode {
			type_url: any.type_url.clone(),
			reason,
		})?;
		Ok(LedgerMsg {
			type_url: any.type_url.clone(),
			amino_type: entry.amino_type.clone(),
			value,
		})
	}
}

/// Reads an unsigned integer rendered either as a JSON number or a decimal string.
fn read_u64(value: &Value, field: &str) -> Result<u64, String> {
	match value.get(field) {
		Some(Value::String(s)) => s
			.parse()
			.map_err(|_| format!("field '{}' is not an unsigned integer: {}", field, s)),
		Some(Value::Number(n)) => n
			.as_u64()
			.ok_or_else(|| format!("field '{}' is not an unsigned integer: {}", field, n)),
		// Proto3 JSON omits zero values.
		None | Some(Value::Null) => Ok(0),
		Some(other) => Err(format!("field '{}' has unexpected type: {}", field, other)),
	}
}

fn nested<'a>(value: &'a Value, field: &str) -> Result<&'a Value, String> {
	value
		.get(field)
		.filter(|v| v.is_object())
		.ok_or_else(|| format!("missing object field '{}'", field))
}

fn decode_base_account(value: &Value) -> Result<AccountInfo, String> {
	let address = value
		.get("address")
		.and_then(Value::as_str)
		.ok_or_else(|| "missing field 'address'".to_string())?;
	Ok(AccountInfo {
		address: address.to_string(),
		account_number: read_u64(value, "account_number")?,
		sequence: read_u64(value, "sequence")?,
	})
}

fn decode_wrapped_base_account(value: &Value) -> Result<AccountInfo, String> {
	decode_base_account(nested(value, "base_account")?)
}

fn decode_vesting_account(value: &Value) -> Result<AccountInfo, String> {
	decode_wrapped_base_account(nested(value, "base_vesting_account")?)
}
