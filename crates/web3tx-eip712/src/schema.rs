//! Per-message EIP-712 layouts.

use crate::typed_data::Eip712Field;
use std::collections::HashMap;
use web3tx_types::{Eip712AllowedMsg, Eip712MsgAttrType, EvmParams};

/// EIP-712 layout of one message value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsgSchema {
	/// Struct name the value is typed as.
	pub value_type_name: String,
	/// Fields of the value struct.
	pub value_fields: Vec<Eip712Field>,
	/// Structs referenced from the value, in declaration order.
	pub nested_types: Vec<(String, Vec<Eip712Field>)>,
}

impl MsgSchema {
	pub fn new(value_type_name: impl Into<String>, value_fields: Vec<Eip712Field>) -> Self {
		Self {
			value_type_name: value_type_name.into(),
			value_fields,
			nested_types: Vec::new(),
		}
	}

	pub fn with_nested(mut self, name: impl Into<String>, fields: Vec<Eip712Field>) -> Self {
		self.nested_types.push((name.into(), fields));
		self
	}
}

/// Source of message layouts, keyed by message type URL.
pub trait MsgSchemaProvider: Send + Sync {
	/// Returns the layout of `type_url`, or `None` if the type may not be signed.
	fn msg_schema(&self, type_url: &str) -> Option<MsgSchema>;
}

fn fields(attrs: &[Eip712MsgAttrType]) -> Vec<Eip712Field> {
	attrs
		.iter()
		.map(|attr| Eip712Field::new(&attr.name, &attr.r#type))
		.collect()
}

impl From<&Eip712AllowedMsg> for MsgSchema {
	fn from(msg: &Eip712AllowedMsg) -> Self {
		Self {
			value_type_name: msg.msg_value_type_name.clone(),
			value_fields: fields(&msg.value_types),
			nested_types: msg
				.nested_types
				.iter()
				.map(|nested| (nested.name.clone(), fields(&nested.attrs)))
				.collect(),
		}
	}
}

/// The ledger's allowed-message list is the authoritative layout source.
impl MsgSchemaProvider for EvmParams {
	fn msg_schema(&self, type_url: &str) -> Option<MsgSchema> {
		self.allowed_msg(type_url).map(MsgSchema::from)
	}
}

/// A fixed table of layouts.
#[derive(Debug, Clone, Default)]
pub struct StaticSchemaTable {
	schemas: HashMap<String, MsgSchema>,
}

impl StaticSchemaTable {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, type_url: impl Into<String>, schema: MsgSchema) -> Self {
		self.schemas.insert(type_url.into(), schema);
		self
	}
}

impl MsgSchemaProvider for StaticSchemaTable {
	fn msg_schema(&self, type_url: &str) -> Option<MsgSchema> {
		self.schemas.get(type_url).cloned()
	}
}
