//! Transaction builders.
//!
//! [`TxBuilder`] is the base capability every encoding configuration offers.
//! Attaching extension options is a separate capability, discovered at run
//! time through [`TxBuilder::as_extension_options_builder`].
//!
//! A transaction carrying extension options has exactly one signer, signing
//! in legacy amino-JSON mode. The rule holds whichever of the two setters
//! runs first.

use crate::tx::{SignMode, SignatureV2, SignedTx, SignerInfo};
use crate::EnvelopeError;
use std::sync::Arc;
use web3tx_types::{Any, Coin, InterfaceRegistry, LedgerMsg};

/// Incrementally builds a native transaction.
pub trait TxBuilder: Send {
	/// Packs `msgs` in order and sets them as the body's messages.
	fn set_msgs(&mut self, msgs: &[LedgerMsg]) -> Result<(), EnvelopeError>;

	fn set_memo(&mut self, memo: &str);

	fn set_fee_amount(&mut self, amount: Vec<Coin>);

	fn set_gas_limit(&mut self, gas_limit: u64);

	/// Fills the signer info and signature slots.
	fn set_signatures(&mut self, signatures: Vec<SignatureV2>) -> Result<(), EnvelopeError>;

	/// Returns the transaction built so far.
	fn get_tx(&self) -> SignedTx;

	/// Returns the extension-option capability, if this builder has it.
	fn as_extension_options_builder(&mut self) -> Option<&mut dyn ExtensionOptionsTxBuilder> {
		None
	}
}

/// Builder capability for attaching extension options.
pub trait ExtensionOptionsTxBuilder: TxBuilder {
	/// Sets the body's extension options, checking any signer infos already set.
	fn set_extension_options(&mut self, options: Vec<Any>) -> Result<(), EnvelopeError>;
}

/// Encoding configuration handing out builders for the native envelope.
#[derive(Debug, Clone)]
pub struct TxConfig {
	registry: Arc<InterfaceRegistry>,
}

impl TxConfig {
	pub fn new(registry: Arc<InterfaceRegistry>) -> Self {
		Self { registry }
	}

	pub fn registry(&self) -> &InterfaceRegistry {
		&self.registry
	}

	pub fn new_tx_builder(&self) -> Box<dyn TxBuilder> {
		Box::new(NativeTxBuilder::new(self.registry.clone()))
	}
}

/// Builder for the native envelope, supporting extension options.
pub struct NativeTxBuilder {
	registry: Arc<InterfaceRegistry>,
	tx: SignedTx,
}

impl NativeTxBuilder {
	pub fn new(registry: Arc<InterfaceRegistry>) -> Self {
		Self {
			registry,
			tx: SignedTx::default(),
		}
	}
}

impl TxBuilder for NativeTxBuilder {
	fn set_msgs(&mut self, msgs: &[LedgerMsg]) -> Result<(), EnvelopeError> {
		let packed = msgs
			.iter()
			.map(|msg| self.registry.pack_msg(msg))
			.collect::<Result<Vec<_>, _>>()
			.map_err(|e| EnvelopeError::MessagePack(e.to_string()))?;
		self.tx.body.messages = packed;
		Ok(())
	}

	fn set_memo(&mut self, memo: &str) {
		self.tx.body.memo = memo.to_string();
	}

	fn set_fee_amount(&mut self, amount: Vec<Coin>) {
		self.tx.auth_info.fee.amount = amount;
	}

	fn set_gas_limit(&mut self, gas_limit: u64) {
		self.tx.auth_info.fee.gas_limit = gas_limit;
	}

	fn set_signatures(&mut self, signatures: Vec<SignatureV2>) -> Result<(), EnvelopeError> {
		if !self.tx.body.extension_options.is_empty() {
			let modes: Vec<SignMode> = signatures.iter().map(|sig| sig.data.sign_mode).collect();
			check_extension_slots(&modes)?;
		}

		let (signer_infos, raw): (Vec<_>, Vec<_>) = signatures
			.into_iter()
			.map(|sig| {
				(
					SignerInfo {
						public_key: sig.pub_key,
						mode_info: sig.data.sign_mode,
						sequence: sig.sequence,
					},
					sig.data.signature,
				)
			})
			.unzip();
		self.tx.auth_info.signer_infos = signer_infos;
		self.tx.signatures = raw;
		Ok(())
	}

	fn get_tx(&self) -> SignedTx {
		self.tx.clone()
	}

	fn as_extension_options_builder(&mut self) -> Option<&mut dyn ExtensionOptionsTxBuilder> {
		Some(self as &mut dyn ExtensionOptionsTxBuilder)
	}
}

impl ExtensionOptionsTxBuilder for NativeTxBuilder {
	fn set_extension_options(&mut self, options: Vec<Any>) -> Result<(), EnvelopeError> {
		let signer_infos = &self.tx.auth_info.signer_infos;
		if !options.is_empty() && !signer_infos.is_empty() {
			let modes: Vec<SignMode> = signer_infos.iter().map(|info| info.mode_info).collect();
			check_extension_slots(&modes)?;
		}
		self.tx.body.extension_options = options;
		Ok(())
	}
}

fn check_extension_slots(modes: &[SignMode]) -> Result<(), EnvelopeError> {
	if modes.len() != 1 {
		return Err(EnvelopeError::SignatureSlot(format!(
			"web3 transactions carry exactly one signer, got {}",
			modes.len()
		)));
	}
	if modes.iter().any(|mode| *mode != SignMode::LegacyAminoJson) {
		return Err(EnvelopeError::SignatureSlot(
			"web3 transactions must use SIGN_MODE_LEGACY_AMINO_JSON".into(),
		));
	}
	Ok(())
}
