//! Native envelope assembly for EIP-712 signed transactions.
//!
//! Given the fields a wallet signed and the resulting signature, this module
//! produces the ledger-native transaction: the signature rides in a web3
//! extension option, and every field the wallet saw (fee, messages, memo,
//! sequence) is set on the envelope unchanged.

use thiserror::Error;
use web3tx_types::{LedgerMsg, PubKey, StdFee};

pub mod builder;
pub mod tx;

pub use builder::{ExtensionOptionsTxBuilder, NativeTxBuilder, TxBuilder, TxConfig};
pub use tx::{
	AuthInfo, ExtensionOptionsWeb3Tx, Fee, SignMode, SignatureV2, SignedTx, SignerInfo,
	SingleSignatureData, TxBody, EXTENSION_OPTIONS_WEB3TX_TYPE_URL,
};

/// Errors that can occur while assembling an envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
	/// The builder cannot carry extension options.
	#[error("Unsupported builder: {0}")]
	UnsupportedBuilder(String),
	/// The builder rejected the signature slot.
	#[error("Invalid signature slot: {0}")]
	SignatureSlot(String),
	/// A message could not be packed.
	#[error("Failed to pack message: {0}")]
	MessagePack(String),
}

/// Everything the envelope is assembled from.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeParts<'a> {
	pub fee: &'a StdFee,
	pub sequence: u64,
	pub msgs: &'a [LedgerMsg],
	pub memo: &'a str,
	/// 65-byte signature with v already normalized to 27/28.
	pub signature: &'a [u8],
	pub pub_key: &'a PubKey,
	/// Ledger address recorded as paying the fee.
	pub fee_payer: &'a str,
	/// EVM chain id the typed data was signed under.
	pub typed_data_chain_id: u64,
}

/// Assembles a signed envelope into `builder`.
///
/// On error the builder is dropped; a partially assembled transaction is
/// never returned.
pub fn assemble(
	mut builder: Box<dyn TxBuilder>,
	parts: &EnvelopeParts<'_>,
) -> Result<Box<dyn TxBuilder>, EnvelopeError> {
	let extension = ExtensionOptionsWeb3Tx {
		typed_data_chain_id: parts.typed_data_chain_id,
		fee_payer: parts.fee_payer.to_string(),
		fee_payer_sig: parts.signature.to_vec(),
	}
	.to_any()
	.map_err(|e| EnvelopeError::MessagePack(format!("extension option: {}", e)))?;

	let extension_builder = builder.as_extension_options_builder().ok_or_else(|| {
		EnvelopeError::UnsupportedBuilder("builder does not support extension options".into())
	})?;
	extension_builder.set_extension_options(vec![extension])?;

	builder.set_fee_amount(parts.fee.amount.clone());
	builder.set_gas_limit(parts.fee.gas);

	// Placeholder slot: the proof is in the extension option.
	builder.set_signatures(vec![SignatureV2 {
		pub_key: parts.pub_key.clone(),
		data: SingleSignatureData {
			sign_mode: SignMode::LegacyAminoJson,
			signature: Vec::new(),
		},
		sequence: parts.sequence,
	}])?;

	builder.set_msgs(parts.msgs)?;
	builder.set_memo(parts.memo);

	tracing::debug!(
		msg_count = parts.msgs.len(),
		sequence = parts.sequence,
		fee_payer = %parts.fee_payer,
		"Assembled web3 envelope"
	);
	Ok(builder)
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use std::sync::Arc;
	use web3tx_types::{Coin, InterfaceRegistry};

	/// A builder without the extension-option capability.
	struct BareBuilder(SignedTx);

	impl TxBuilder for BareBuilder {
		fn set_msgs(&mut self, _msgs: &[LedgerMsg]) -> Result<(), EnvelopeError> {
			Ok(())
		}
		fn set_memo(&mut self, memo: &str) {
			self.0.body.memo = memo.to_string();
		}
		fn set_fee_amount(&mut self, amount: Vec<Coin>) {
			self.0.auth_info.fee.amount = amount;
		}
		fn set_gas_limit(&mut self, gas_limit: u64) {
			self.0.auth_info.fee.gas_limit = gas_limit;
		}
		fn set_signatures(&mut self, _signatures: Vec<SignatureV2>) -> Result<(), EnvelopeError> {
			Ok(())
		}
		fn get_tx(&self) -> SignedTx {
			self.0.clone()
		}
	}

	fn msgs() -> Vec<LedgerMsg> {
		vec![LedgerMsg::new(
			"/cosmos.bank.v1beta1.MsgSend",
			"cosmos-sdk/MsgSend",
			json!({"from_address": "kava1a", "to_address": "kava1b", "amount": []}),
		)]
	}

	fn parts<'a>(
		fee: &'a StdFee,
		msgs: &'a [LedgerMsg],
		pub_key: &'a PubKey,
		signature: &'a [u8],
	) -> EnvelopeParts<'a> {
		EnvelopeParts {
			fee,
			sequence: 5,
			msgs,
			memo: "hello",
			signature,
			pub_key,
			fee_payer: "kava1a",
			typed_data_chain_id: 9000,
		}
	}

	#[test]
	fn test_assemble() {
		let registry = Arc::new(InterfaceRegistry::with_defaults());
		let fee = StdFee::new(200000, vec![Coin::new(1000, "stake")]);
		let msgs = msgs();
		let pub_key = PubKey::eth_secp256k1(vec![3; 33]);
		let signature = [7u8; 65];

		let builder = TxConfig::new(registry.clone()).new_tx_builder();
		let tx = assemble(builder, &parts(&fee, &msgs, &pub_key, &signature))
			.unwrap()
			.get_tx();

		assert_eq!(tx.auth_info.fee.amount, fee.amount);
		assert_eq!(tx.auth_info.fee.gas_limit, 200000);
		assert_eq!(tx.body.memo, "hello");
		assert_eq!(tx.messages(&registry).unwrap(), msgs);

		let signer = &tx.auth_info.signer_infos[0];
		assert_eq!(signer.mode_info, SignMode::LegacyAminoJson);
		assert_eq!(signer.sequence, 5);
		assert_eq!(signer.public_key, pub_key);
		assert_eq!(tx.signatures, vec![Vec::<u8>::new()]);

		let extension = tx.web3_extension().unwrap();
		assert_eq!(extension.typed_data_chain_id, 9000);
		assert_eq!(extension.fee_payer, "kava1a");
		assert_eq!(extension.fee_payer_sig, signature.to_vec());
	}

	#[test]
	fn test_builder_without_extension_support() {
		let fee = StdFee::new(1, vec![]);
		let msgs = msgs();
		let pub_key = PubKey::eth_secp256k1(vec![3; 33]);
		let result = assemble(
			Box::new(BareBuilder(SignedTx::default())),
			&parts(&fee, &msgs, &pub_key, &[0; 65]),
		);
		assert!(matches!(result, Err(EnvelopeError::UnsupportedBuilder(_))));
	}

	#[test]
	fn test_unregistered_message() {
		let registry = Arc::new(InterfaceRegistry::new());
		let fee = StdFee::new(1, vec![]);
		let msgs = msgs();
		let pub_key = PubKey::eth_secp256k1(vec![3; 33]);
		let result = assemble(
			TxConfig::new(registry).new_tx_builder(),
			&parts(&fee, &msgs, &pub_key, &[0; 65]),
		);
		assert!(matches!(result, Err(EnvelopeError::MessagePack(_))));
	}
}
