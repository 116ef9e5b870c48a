//! EIP-712 hashing.
//!
//! Implements `encodeType`, `encodeData` and `hashStruct` over JSON values for
//! the atomic types `string`, `bytes`, `bool`, `address`, `uint<N>`, `int<N>`
//! and `bytes<N>`, fixed and dynamic arrays, and struct references. A field
//! absent from the value (or `null`) encodes as its type's zero value.

use crate::typed_data::{TypedData, Types, DOMAIN_TYPE_NAME};
use crate::TypedDataError;
use alloy_primitives::{keccak256, Address, B256, I256, U256};
use serde_json::Value;
use std::collections::BTreeSet;
use std::str::FromStr;
use web3tx_types::utils::{compute_final_digest, Eip712AbiEncoder};
use web3tx_types::without_0x_prefix;

/// Computes `keccak256(0x1901 || hashStruct(domain) || hashStruct(message))`.
pub fn compute_typed_data_hash(typed_data: &TypedData) -> Result<B256, TypedDataError> {
	let domain_separator = hash_struct(
		&typed_data.types,
		DOMAIN_TYPE_NAME,
		&typed_data.domain.to_value(),
	)?;
	let message_hash = hash_struct(
		&typed_data.types,
		&typed_data.primary_type,
		&typed_data.message,
	)?;
	Ok(compute_final_digest(&domain_separator, &message_hash))
}

/// `keccak256(typeHash || encodeData(value))`.
pub fn hash_struct(types: &Types, type_name: &str, value: &Value) -> Result<B256, TypedDataError> {
	let object = match value {
		Value::Object(object) => object,
		other => return Err(mismatch(type_name, other)),
	};
	let fields = types
		.get(type_name)
		.ok_or_else(|| TypedDataError::HashCompute(format!("no schema for type '{}'", type_name)))?;

	let mut encoder = Eip712AbiEncoder::new();
	encoder.push_b256(&keccak256(encode_type(types, type_name)?.as_bytes()));
	for field in fields {
		let field_value = object.get(&field.name).filter(|v| !v.is_null());
		encode_value(types, &field.r#type, field_value, &mut encoder).map_err(|e| match e {
			TypedDataError::HashCompute(reason) => TypedDataError::HashCompute(format!(
				"{}.{}: {}",
				type_name, field.name, reason
			)),
			other => other,
		})?;
	}
	Ok(keccak256(encoder.finish()))
}

/// Renders `Name(type1 name1,...)` for `type_name` followed by every struct it
/// references, sorted by name.
pub fn encode_type(types: &Types, type_name: &str) -> Result<String, TypedDataError> {
	let mut dependencies = BTreeSet::new();
	collect_dependencies(types, type_name, &mut dependencies)?;
	dependencies.remove(type_name);

	let mut encoded = render_struct(types, type_name)?;
	for dependency in &dependencies {
		encoded.push_str(&render_struct(types, dependency)?);
	}
	Ok(encoded)
}

fn render_struct(types: &Types, type_name: &str) -> Result<String, TypedDataError> {
	let fields = types
		.get(type_name)
		.ok_or_else(|| TypedDataError::HashCompute(format!("no schema for type '{}'", type_name)))?;
	let members: Vec<String> = fields
		.iter()
		.map(|field| format!("{} {}", field.r#type, field.name))
		.collect();
	Ok(format!("{}({})", type_name, members.join(",")))
}

fn collect_dependencies(
	types: &Types,
	type_name: &str,
	found: &mut BTreeSet<String>,
) -> Result<(), TypedDataError> {
	if !found.insert(type_name.to_string()) {
		return Ok(());
	}
	let fields = types
		.get(type_name)
		.ok_or_else(|| TypedDataError::HashCompute(format!("no schema for type '{}'", type_name)))?;
	for field in fields {
		let base = element_base(&field.r#type);
		if Atomic::parse(base).is_none() {
			collect_dependencies(types, base, found)?;
		}
	}
	Ok(())
}

/// Strips every array suffix: `Coin[][2]` -> `Coin`.
fn element_base(type_name: &str) -> &str {
	type_name.split('[').next().unwrap_or(type_name)
}

/// Splits `T[]` / `T[k]` into the element type and the optional fixed length.
fn split_array(type_name: &str) -> Result<Option<(&str, Option<usize>)>, TypedDataError> {
	let Some(inner) = type_name.strip_suffix(']') else {
		return Ok(None);
	};
	let open = inner
		.rfind('[')
		.ok_or_else(|| TypedDataError::HashCompute(format!("malformed type '{}'", type_name)))?;
	let length = &inner[open + 1..];
	let length = if length.is_empty() {
		None
	} else {
		Some(length.parse::<usize>().map_err(|_| {
			TypedDataError::HashCompute(format!("malformed array length in '{}'", type_name))
		})?)
	};
	Ok(Some((&inner[..open], length)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Atomic {
	String,
	Bytes,
	Bool,
	Address,
	Uint(usize),
	Int(usize),
	FixedBytes(usize),
}

impl Atomic {
	fn parse(type_name: &str) -> Option<Self> {
		match type_name {
			"string" => return Some(Atomic::String),
			"bytes" => return Some(Atomic::Bytes),
			"bool" => return Some(Atomic::Bool),
			"address" => return Some(Atomic::Address),
			_ => {},
		}
		let sized = |prefix: &str| -> Option<usize> {
			type_name.strip_prefix(prefix)?.parse::<usize>().ok()
		};
		if let Some(bits) = sized("uint").filter(|b| valid_int_width(*b)) {
			return Some(Atomic::Uint(bits));
		}
		if let Some(bits) = sized("int").filter(|b| valid_int_width(*b)) {
			return Some(Atomic::Int(bits));
		}
		sized("bytes")
			.filter(|n| (1..=32).contains(n))
			.map(Atomic::FixedBytes)
	}
}

fn valid_int_width(bits: usize) -> bool {
	bits % 8 == 0 && (8..=256).contains(&bits)
}

fn encode_value(
	types: &Types,
	type_name: &str,
	value: Option<&Value>,
	encoder: &mut Eip712AbiEncoder,
) -> Result<(), TypedDataError> {
	if let Some((element, fixed_len)) = split_array(type_name)? {
		let items: &[Value] = match value {
			None => &[],
			Some(Value::Array(items)) => items,
			Some(other) => return Err(mismatch(type_name, other)),
		};
		if let Some(len) = fixed_len {
			if value.is_some() && items.len() != len {
				return Err(TypedDataError::HashCompute(format!(
					"expected {} elements for '{}', got {}",
					len,
					type_name,
					items.len()
				)));
			}
		}
		let mut inner = Eip712AbiEncoder::new();
		for item in items {
			encode_value(types, element, Some(item).filter(|v| !v.is_null()), &mut inner)?;
		}
		encoder.push_b256(&keccak256(inner.finish()));
		return Ok(());
	}

	match Atomic::parse(type_name) {
		Some(atomic) => encode_atomic(atomic, type_name, value, encoder),
		None => {
			if !types.contains_key(type_name) {
				return Err(TypedDataError::HashCompute(format!(
					"no schema for type '{}'",
					type_name
				)));
			}
			match value {
				None => encoder.push_b256(&B256::ZERO),
				Some(value) => encoder.push_b256(&hash_struct(types, type_name, value)?),
			}
			Ok(())
		},
	}
}

fn encode_atomic(
	atomic: Atomic,
	type_name: &str,
	value: Option<&Value>,
	encoder: &mut Eip712AbiEncoder,
) -> Result<(), TypedDataError> {
	match atomic {
		Atomic::String => {
			let text = match value {
				None => "",
				Some(Value::String(s)) => s.as_str(),
				Some(other) => return Err(mismatch(type_name, other)),
			};
			encoder.push_b256(&keccak256(text.as_bytes()));
		},
		Atomic::Bytes => {
			let bytes = match value {
				None => Vec::new(),
				Some(v) => parse_hex(type_name, v)?,
			};
			encoder.push_b256(&keccak256(bytes));
		},
		Atomic::Bool => {
			let flag = match value {
				None => false,
				Some(Value::Bool(b)) => *b,
				Some(Value::String(s)) if s == "true" => true,
				Some(Value::String(s)) if s == "false" => false,
				Some(other) => return Err(mismatch(type_name, other)),
			};
			encoder.push_bool(flag);
		},
		Atomic::Address => {
			let address = match value {
				None => Address::ZERO,
				Some(Value::String(s)) => {
					Address::from_str(s).map_err(|_| mismatch(type_name, &Value::String(s.clone())))?
				},
				Some(other) => return Err(mismatch(type_name, other)),
			};
			encoder.push_address(&address);
		},
		Atomic::Uint(bits) => {
			let number = match value {
				None => U256::ZERO,
				Some(v) => parse_uint(type_name, v)?,
			};
			if number.bit_len() > bits {
				return Err(TypedDataError::HashCompute(format!(
					"value {} overflows {}",
					number, type_name
				)));
			}
			encoder.push_u256(number);
		},
		Atomic::Int(bits) => {
			let number = match value {
				None => I256::ZERO,
				Some(v) => parse_int(type_name, v)?,
			};
			if !fits_signed(number, bits) {
				return Err(TypedDataError::HashCompute(format!(
					"value {} overflows {}",
					number, type_name
				)));
			}
			encoder.push_i256(number);
		},
		Atomic::FixedBytes(len) => {
			let bytes = match value {
				None => Vec::new(),
				Some(v) => parse_hex(type_name, v)?,
			};
			if bytes.len() > len {
				return Err(TypedDataError::HashCompute(format!(
					"{} bytes do not fit {}",
					bytes.len(),
					type_name
				)));
			}
			encoder.push_fixed_bytes(&bytes);
		},
	}
	Ok(())
}

fn parse_hex(type_name: &str, value: &Value) -> Result<Vec<u8>, TypedDataError> {
	match value {
		Value::String(s) => hex::decode(without_0x_prefix(s)).map_err(|_| mismatch(type_name, value)),
		other => Err(mismatch(type_name, other)),
	}
}

fn parse_uint(type_name: &str, value: &Value) -> Result<U256, TypedDataError> {
	let parsed = match value {
		Value::Number(n) => n.as_u64().map(U256::from),
		Value::String(s) => match s.strip_prefix("0x") {
			Some(hex) => U256::from_str_radix(hex, 16).ok(),
			None => U256::from_str_radix(s, 10).ok(),
		},
		_ => None,
	};
	parsed.ok_or_else(|| mismatch(type_name, value))
}

fn parse_int(type_name: &str, value: &Value) -> Result<I256, TypedDataError> {
	let parsed = match value {
		Value::Number(n) if n.is_i64() || n.is_u64() => I256::from_dec_str(&n.to_string()).ok(),
		Value::String(s) if s.starts_with("0x") || s.starts_with("-0x") => {
			I256::from_hex_str(s).ok()
		},
		Value::String(s) => I256::from_dec_str(s).ok(),
		_ => None,
	};
	parsed.ok_or_else(|| mismatch(type_name, value))
}

/// Whether `value` lies in `[-2^(bits-1), 2^(bits-1))`.
fn fits_signed(value: I256, bits: usize) -> bool {
	if bits >= 256 {
		return true;
	}
	let magnitude = value.unsigned_abs();
	let limit = U256::from(1u8) << (bits - 1);
	if value.is_negative() {
		magnitude <= limit
	} else {
		magnitude < limit
	}
}

fn mismatch(type_name: &str, value: &Value) -> TypedDataError {
	TypedDataError::HashCompute(format!("value {} does not fit type '{}'", value, type_name))
}
