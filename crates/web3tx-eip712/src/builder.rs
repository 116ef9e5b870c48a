//! Reduces a ledger transaction to EIP-712 typed data.
//!
//! The message is the legacy sign document with its `msgs` array spread into
//! `msg1..msgN`, each typed as `Msg{i} { type: string, value: <layout> }`.
//! With fee delegation the fee additionally names its payer.

use crate::schema::MsgSchemaProvider;
use crate::sign_doc::StdSignDoc;
use crate::typed_data::{Eip712Domain, Eip712Field, TypedData, Types, DOMAIN_TYPE_NAME};
use crate::TypedDataError;
use serde_json::Value;
use web3tx_types::{parse_chain_id, LedgerMsg, StdFee};

/// Primary type of every transaction payload.
pub const TX_TYPE_NAME: &str = "Tx";

/// The transaction fields that are signed.
#[derive(Debug, Clone, Copy)]
pub struct TxFields<'a> {
	/// Ledger chain identifier, e.g. `test_9000-1`.
	pub chain_id: &'a str,
	pub account_number: u64,
	pub sequence: u64,
	pub fee: &'a StdFee,
	pub msgs: &'a [LedgerMsg],
	pub memo: &'a str,
}

/// Builds typed data under a fixed domain name and version.
#[derive(Debug, Clone)]
pub struct TypedDataBuilder {
	domain_name: String,
	domain_version: String,
}

impl Default for TypedDataBuilder {
	fn default() -> Self {
		Self::new("Kava Cosmos", "1.0.0")
	}
}

impl TypedDataBuilder {
	pub fn new(domain_name: impl Into<String>, domain_version: impl Into<String>) -> Self {
		Self {
			domain_name: domain_name.into(),
			domain_version: domain_version.into(),
		}
	}

	/// Builds the typed data a wallet signs for `tx`.
	///
	/// `fee_payer` enables fee delegation: the fee names the payer, who is
	/// expected to countersign outside this payload.
	pub fn build(
		&self,
		tx: &TxFields<'_>,
		schemas: &dyn MsgSchemaProvider,
		fee_payer: Option<&str>,
	) -> Result<TypedData, TypedDataError> {
		let evm_chain_id = parse_chain_id(tx.chain_id)?;
		let sign_doc = StdSignDoc::new(
			tx.chain_id,
			tx.account_number,
			tx.sequence,
			0,
			tx.fee,
			tx.msgs,
			tx.memo,
		);

		let types = self.types(tx.msgs, schemas, fee_payer.is_some())?;
		let message = message_body(&sign_doc, fee_payer);
		let domain = Eip712Domain::new(&self.domain_name, &self.domain_version, evm_chain_id);
		check_domain_invariant(&domain)?;

		tracing::debug!(
			chain_id = %tx.chain_id,
			evm_chain_id,
			msg_count = tx.msgs.len(),
			fee_delegated = fee_payer.is_some(),
			"Built typed data"
		);

		Ok(TypedData {
			types,
			primary_type: TX_TYPE_NAME.to_string(),
			domain,
			message,
		})
	}

	fn types(
		&self,
		msgs: &[LedgerMsg],
		schemas: &dyn MsgSchemaProvider,
		fee_delegated: bool,
	) -> Result<Types, TypedDataError> {
		let mut types = Types::new();
		types.insert(DOMAIN_TYPE_NAME.to_string(), Eip712Domain::fields());

		let mut fee_fields = Vec::new();
		if fee_delegated {
			fee_fields.push(Eip712Field::new("feePayer", "string"));
		}
		fee_fields.push(Eip712Field::new("amount", "Coin[]"));
		fee_fields.push(Eip712Field::new("gas", "string"));
		types.insert("Fee".to_string(), fee_fields);
		types.insert(
			"Coin".to_string(),
			vec![
				Eip712Field::new("denom", "string"),
				Eip712Field::new("amount", "string"),
			],
		);

		let mut tx_fields = vec![
			Eip712Field::new("account_number", "string"),
			Eip712Field::new("chain_id", "string"),
			Eip712Field::new("fee", "Fee"),
			Eip712Field::new("memo", "string"),
			Eip712Field::new("sequence", "string"),
		];

		for (index, msg) in msgs.iter().enumerate() {
			let schema = schemas
				.msg_schema(&msg.type_url)
				.ok_or_else(|| TypedDataError::UnsupportedMessage(msg.type_url.clone()))?;

			let msg_type = format!("Msg{}", index + 1);
			tx_fields.push(Eip712Field::new(format!("msg{}", index + 1), &msg_type));
			types.insert(
				msg_type,
				vec![
					Eip712Field::new("type", "string"),
					Eip712Field::new("value", &schema.value_type_name),
				],
			);

			// First definition of a type name wins.
			types
				.entry(schema.value_type_name)
				.or_insert(schema.value_fields);
			for (name, fields) in schema.nested_types {
				types.entry(name).or_insert(fields);
			}
		}

		types.insert(TX_TYPE_NAME.to_string(), tx_fields);
		Ok(types)
	}
}

/// The sign document with `msgs` spread into `msg1..msgN`.
fn message_body(sign_doc: &StdSignDoc, fee_payer: Option<&str>) -> Value {
	let mut body = sign_doc.to_json();
	if let Value::Object(map) = &mut body {
		map.remove("msgs");
		for (index, msg) in sign_doc.msgs.iter().enumerate() {
			map.insert(format!("msg{}", index + 1), msg.clone());
		}
		if let (Some(payer), Some(Value::Object(fee))) = (fee_payer, map.get_mut("fee")) {
			fee.insert("feePayer".to_string(), Value::String(payer.to_string()));
		}
	}
	body
}

/// Rejects a domain whose verifying contract or salt is set.
///
/// Such a domain cannot be verified by the ledger and is never repaired.
pub fn check_domain_invariant(domain: &Eip712Domain) -> Result<(), TypedDataError> {
	if !domain.verifying_contract.is_empty() {
		return Err(TypedDataError::DomainInvariant(format!(
			"verifyingContract must be empty, got '{}'",
			domain.verifying_contract
		)));
	}
	if !domain.salt.is_empty() {
		return Err(TypedDataError::DomainInvariant(format!(
			"salt must be empty, got '{}'",
			domain.salt
		)));
	}
	Ok(())
}
