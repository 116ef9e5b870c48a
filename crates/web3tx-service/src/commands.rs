//! Subcommand implementations.
//!
//! Each command returns the JSON document it prints; logging goes to stderr
//! so stdout stays machine-readable.

use alloy_primitives::{Address, B256};
use serde_json::{json, Value};
use std::path::Path;
use std::str::FromStr;
use web3tx_account::{compressed_pub_key, recover_public_key, RecoverableSignature, SIGNATURE_LEN};
use web3tx_core::{Eip712TxSigner, SignRequest};
use web3tx_types::{with_0x_prefix, without_0x_prefix};

type CommandResult = Result<Value, Box<dyn std::error::Error>>;

/// Reads a request file, letting `fee_payer` override the file's payer.
pub async fn load_request(
	path: &Path,
	fee_payer: Option<String>,
) -> Result<SignRequest, Box<dyn std::error::Error>> {
	let content = tokio::fs::read_to_string(path).await.map_err(|e| {
		format!("Failed to read request file {}: {}", path.display(), e)
	})?;
	let mut request: SignRequest = serde_json::from_str(&content)
		.map_err(|e| format!("Invalid request file {}: {}", path.display(), e))?;
	if fee_payer.is_some() {
		request.fee_payer = fee_payer;
	}
	if request.msgs.is_empty() {
		return Err("Request must contain at least one message".into());
	}
	Ok(request)
}

pub async fn sign(signer: &Eip712TxSigner, request: &SignRequest) -> CommandResult {
	let signed = signer.sign(request).await?;
	Ok(json!({
		"tx": signed.tx,
		"hash": signed.hash,
		"signature": with_0x_prefix(&hex::encode(signed.signature.as_bytes())),
		"account": signed.account_state,
	}))
}

pub async fn typed_data(signer: &Eip712TxSigner, request: &SignRequest) -> CommandResult {
	let prepared = signer.prepare(request).await?;
	Ok(serde_json::to_value(prepared)?)
}

pub async fn account(signer: &Eip712TxSigner) -> CommandResult {
	let identity = signer.identity();
	let state = signer.account_state().await?;
	Ok(json!({
		"address": identity.ledger_address,
		"evm_address": identity.evm_address,
		"pub_key": identity.pub_key,
		"account_number": state.account_number,
		"sequence": state.sequence,
	}))
}

/// Recovers the signer of a typed-data hash.
pub fn verify(hash: &str, signature: &str) -> CommandResult {
	let hash = B256::from_str(hash).map_err(|e| format!("Invalid hash: {}", e))?;
	let bytes = hex::decode(without_0x_prefix(signature))
		.map_err(|e| format!("Invalid signature hex: {}", e))?;
	let bytes: [u8; SIGNATURE_LEN] = bytes
		.try_into()
		.map_err(|b: Vec<u8>| format!("Signature must be {} bytes, got {}", SIGNATURE_LEN, b.len()))?;

	let key = recover_public_key(&hash, &RecoverableSignature(bytes))?;
	Ok(json!({
		"evm_address": Address::from_public_key(&key),
		"pub_key": compressed_pub_key(&key),
	}))
}
