//! The native signed transaction.
//!
//! A web3 transaction is signed in two places. The signer info and signature
//! slots carry a placeholder (legacy amino-JSON mode, empty signature) so the
//! ledger knows who signed and at which sequence; the actual proof, the
//! EIP-712 signature, travels in the body's extension options.

use serde::{Deserialize, Serialize};
use web3tx_types::{Any, Coin, InterfaceRegistry, LedgerMsg, PubKey, RegistryError};

/// Type URL of the web3 extension option.
pub const EXTENSION_OPTIONS_WEB3TX_TYPE_URL: &str = "/ethermint.types.v1.ExtensionOptionsWeb3Tx";

/// Signing mode of a signature slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignMode {
	#[serde(rename = "SIGN_MODE_DIRECT")]
	Direct,
	#[serde(rename = "SIGN_MODE_LEGACY_AMINO_JSON")]
	LegacyAminoJson,
}

/// Signature bytes of a single signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleSignatureData {
	pub sign_mode: SignMode,
	#[serde(with = "web3tx_types::utils::serde_hex")]
	pub signature: Vec<u8>,
}

/// A signature slot: who signed, how, and at which sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureV2 {
	pub pub_key: PubKey,
	pub data: SingleSignatureData,
	pub sequence: u64,
}

/// Extension option carrying the EIP-712 signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionOptionsWeb3Tx {
	/// EVM chain id the typed data was signed under.
	pub typed_data_chain_id: u64,
	/// Ledger address paying the fee.
	pub fee_payer: String,
	/// 65-byte `r || s || v` signature, v in {27, 28}.
	#[serde(with = "web3tx_types::utils::serde_hex")]
	pub fee_payer_sig: Vec<u8>,
}

impl ExtensionOptionsWeb3Tx {
	/// Packs the option under its type URL.
	pub fn to_any(&self) -> Result<Any, serde_json::Error> {
		Ok(Any {
			type_url: EXTENSION_OPTIONS_WEB3TX_TYPE_URL.to_string(),
			value: serde_json::to_vec(self)?,
		})
	}

	/// Unpacks an option packed by [`Self::to_any`], or `None` for other types.
	pub fn from_any(any: &Any) -> Option<Result<Self, serde_json::Error>> {
		(any.type_url == EXTENSION_OPTIONS_WEB3TX_TYPE_URL)
			.then(|| serde_json::from_slice(&any.value))
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxBody {
	pub messages: Vec<Any>,
	pub memo: String,
	pub timeout_height: u64,
	pub extension_options: Vec<Any>,
	pub non_critical_extension_options: Vec<Any>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerInfo {
	pub public_key: PubKey,
	pub mode_info: SignMode,
	pub sequence: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
	pub amount: Vec<Coin>,
	pub gas_limit: u64,
	pub payer: String,
	pub granter: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfo {
	pub signer_infos: Vec<SignerInfo>,
	pub fee: Fee,
}

/// A transaction in the ledger's native envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTx {
	pub body: TxBody,
	pub auth_info: AuthInfo,
	#[serde(with = "hex_list")]
	pub signatures: Vec<Vec<u8>>,
}

impl SignedTx {
	/// Unpacks the body's messages in order.
	pub fn messages(&self, registry: &InterfaceRegistry) -> Result<Vec<LedgerMsg>, RegistryError> {
		self.body
			.messages
			.iter()
			.map(|any| registry.unpack_msg(any))
			.collect()
	}

	/// Returns the web3 extension option, if one is attached and well-formed.
	pub fn web3_extension(&self) -> Option<ExtensionOptionsWeb3Tx> {
		self.body
			.extension_options
			.iter()
			.find_map(ExtensionOptionsWeb3Tx::from_any)
			.and_then(Result::ok)
	}
}

mod hex_list {
	use serde::{Deserialize, Deserializer, Serialize, Serializer};
	use web3tx_types::{with_0x_prefix, without_0x_prefix};

	pub fn serialize<S: Serializer>(items: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
		items
			.iter()
			.map(|bytes| with_0x_prefix(&hex::encode(bytes)))
			.collect::<Vec<_>>()
			.serialize(serializer)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error> {
		Vec::<String>::deserialize(deserializer)?
			.iter()
			.map(|s| hex::decode(without_0x_prefix(s)).map_err(serde::de::Error::custom))
			.collect()
	}
}
