//! The EIP-712 transaction signer.

use crate::SignError;
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use web3tx_account::{AccountService, RecoverableSignature, SignerIdentity};
use web3tx_eip712::{compute_typed_data_hash, TxFields, TypedData, TypedDataBuilder};
use web3tx_envelope::{assemble, EnvelopeParts, SignedTx, TxConfig};
use web3tx_ledger::LedgerService;
use web3tx_types::{AccountState, LedgerMsg, StdFee};

/// What to sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignRequest {
	/// Messages, in execution order.
	pub msgs: Vec<LedgerMsg>,
	pub fee: StdFee,
	#[serde(default)]
	pub memo: String,
	/// Address paying the fee; the signer pays when unset.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub fee_payer: Option<String>,
}

/// Typed data ready to be signed, with the state it was built from.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedTx {
	pub account_state: AccountState,
	pub fee_payer: String,
	pub typed_data: TypedData,
	pub hash: B256,
}

/// The result of a signing operation.
#[derive(Debug, Clone)]
pub struct SignedEnvelope {
	pub tx: SignedTx,
	pub typed_data: TypedData,
	pub hash: B256,
	/// Signature embedded in the envelope, v in {27, 28}.
	pub signature: RecoverableSignature,
	pub account_state: AccountState,
}

/// Signs ledger transactions with an Ethereum key through EIP-712.
///
/// Holds no per-request state and may be shared across tasks.
pub struct Eip712TxSigner {
	ledger: Arc<LedgerService>,
	account: Arc<AccountService>,
	tx_config: TxConfig,
	typed_data: TypedDataBuilder,
	chain_id: String,
}

impl Eip712TxSigner {
	pub fn new(
		ledger: Arc<LedgerService>,
		account: Arc<AccountService>,
		tx_config: TxConfig,
		typed_data: TypedDataBuilder,
		chain_id: impl Into<String>,
	) -> Self {
		Self {
			ledger,
			account,
			tx_config,
			typed_data,
			chain_id: chain_id.into(),
		}
	}

	pub fn identity(&self) -> SignerIdentity {
		self.account.identity()
	}

	pub fn chain_id(&self) -> &str {
		&self.chain_id
	}

	/// Fetches the signer's current sequence and account number.
	pub async fn account_state(&self) -> Result<AccountState, SignError> {
		let identity = self.account.identity();
		Ok(self.ledger.account_state(&identity.ledger_address).await?)
	}

	/// Resolves account state and EVM parameters, then builds and hashes the
	/// typed data for `request`.
	pub async fn prepare(&self, request: &SignRequest) -> Result<PreparedTx, SignError> {
		let identity = self.account.identity();

		// The envelope decodes messages under their registered amino names.
		let registry = self.tx_config.registry();
		for msg in &request.msgs {
			registry
				.check_msg(msg)
				.map_err(|e| SignError::MessagePack(e.to_string()))?;
		}

		let (account_state, evm_params) = tokio::try_join!(
			self.ledger.account_state(&identity.ledger_address),
			self.ledger.evm_params(),
		)?;

		let fee_payer = request
			.fee_payer
			.clone()
			.unwrap_or_else(|| identity.ledger_address.clone());

		let fields = TxFields {
			chain_id: &self.chain_id,
			account_number: account_state.account_number,
			sequence: account_state.sequence,
			fee: &request.fee,
			msgs: &request.msgs,
			memo: &request.memo,
		};
		let typed_data = self
			.typed_data
			.build(&fields, &evm_params, Some(fee_payer.as_str()))?;
		let hash = compute_typed_data_hash(&typed_data)?;

		Ok(PreparedTx {
			account_state,
			fee_payer,
			typed_data,
			hash,
		})
	}

	/// Produces the signed native envelope for `request`.
	pub async fn sign(&self, request: &SignRequest) -> Result<SignedEnvelope, SignError> {
		let prepared = self.prepare(request).await?;
		let identity = self.account.identity();

		let signature = self
			.account
			.sign_hash(&prepared.hash)
			.await?
			.to_eth_convention()?;

		let builder = assemble(
			self.tx_config.new_tx_builder(),
			&EnvelopeParts {
				fee: &request.fee,
				sequence: prepared.account_state.sequence,
				msgs: &request.msgs,
				memo: &request.memo,
				signature: signature.as_bytes(),
				pub_key: &identity.pub_key,
				fee_payer: &prepared.fee_payer,
				typed_data_chain_id: prepared.typed_data.domain.chain_id,
			},
		)?;

		tracing::info!(
			signer = %identity.ledger_address,
			chain_id = %self.chain_id,
			sequence = prepared.account_state.sequence,
			hash = %prepared.hash,
			"Signed transaction"
		);

		Ok(SignedEnvelope {
			tx: builder.get_tx(),
			typed_data: prepared.typed_data,
			hash: prepared.hash,
			signature,
			account_state: prepared.account_state,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use mockall::mock;
	use serde_json::json;
	use web3tx_account::implementations::local::LocalWallet;
	use web3tx_account::{compressed_pub_key, recover_public_key};
	use web3tx_ledger::{LedgerError, LedgerQueryInterface};
	use web3tx_types::{
		AccountRecord, Coin, ConfigSchema, Eip712AllowedMsg, Eip712MsgAttrType, EvmParams,
		InterfaceRegistry, SecretString,
	};

	mock! {
		pub Ledger {}

		#[async_trait]
		impl LedgerQueryInterface for Ledger {
			fn config_schema(&self) -> Box<dyn ConfigSchema>;
			async fn account(&self, address: &str) -> Result<AccountRecord, LedgerError>;
			async fn evm_params(&self) -> Result<EvmParams, LedgerError>;
		}
	}

	const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	const SIGNER: &str = "kava17w0adeg64ky0daxwd2ugyuneellmjgnxlg00a8";
	const SEND: &str = "/cosmos.bank.v1beta1.MsgSend";

	fn account_record() -> AccountRecord {
		AccountRecord::from_tagged(json!({
			"@type": "/ethermint.types.v1.EthAccount",
			"base_account": {
				"address": SIGNER,
				"account_number": "12",
				"sequence": "5",
			},
			"code_hash": "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470",
		}))
		.unwrap()
	}

	fn evm_params() -> EvmParams {
		EvmParams {
			evm_denom: "akava".to_string(),
			eip712_allowed_msgs: vec![Eip712AllowedMsg {
				msg_type_url: SEND.to_string(),
				msg_value_type_name: "MsgValueSend".to_string(),
				value_types: vec![
					Eip712MsgAttrType::new("from_address", "string"),
					Eip712MsgAttrType::new("to_address", "string"),
					Eip712MsgAttrType::new("amount", "Coin[]"),
				],
				nested_types: vec![],
			}],
		}
	}

	fn working_ledger() -> MockLedger {
		let mut ledger = MockLedger::new();
		ledger
			.expect_account()
			.withf(|address| address.to_string() == SIGNER)
			.returning(|_| Ok(account_record()));
		ledger.expect_evm_params().returning(|| Ok(evm_params()));
		ledger
	}

	fn signer_with(ledger: MockLedger, chain_id: &str) -> Eip712TxSigner {
		let registry = Arc::new(InterfaceRegistry::with_defaults());
		let wallet = LocalWallet::new(&SecretString::from(TEST_KEY), "kava").unwrap();
		Eip712TxSigner::new(
			Arc::new(LedgerService::new(Box::new(ledger), registry.clone())),
			Arc::new(AccountService::new(Box::new(wallet))),
			TxConfig::new(registry),
			TypedDataBuilder::default(),
			chain_id,
		)
	}

	fn send_msg(amount: u64) -> LedgerMsg {
		LedgerMsg::new(
			SEND,
			"cosmos-sdk/MsgSend",
			json!({
				"from_address": SIGNER,
				"to_address": "kava1recipient",
				"amount": [{"denom": "stake", "amount": amount.to_string()}],
			}),
		)
	}

	fn request(fee_payer: Option<&str>) -> SignRequest {
		SignRequest {
			msgs: vec![send_msg(10)],
			fee: StdFee::new(200000, vec![Coin::new(1000, "stake")]),
			memo: "hello".to_string(),
			fee_payer: fee_payer.map(str::to_string),
		}
	}

	#[tokio::test]
	async fn test_sign_single_message() {
		let signer = signer_with(working_ledger(), "test_9000-1");
		let request = request(None);
		let signed = signer.sign(&request).await.unwrap();
		let tx = &signed.tx;

		// Envelope fields equal the inputs
		assert_eq!(tx.auth_info.fee.amount, request.fee.amount);
		assert_eq!(tx.auth_info.fee.gas_limit, 200000);
		assert_eq!(tx.body.memo, "hello");
		let registry = InterfaceRegistry::with_defaults();
		assert_eq!(tx.messages(&registry).unwrap(), request.msgs);
		assert_eq!(tx.auth_info.signer_infos[0].sequence, 5);

		// ...and equal what the wallet saw
		let message = &signed.typed_data.message;
		assert_eq!(message["account_number"], "12");
		assert_eq!(message["sequence"], "5");
		assert_eq!(message["chain_id"], "test_9000-1");
		assert_eq!(message["memo"], "hello");
		assert_eq!(message["fee"]["gas"], "200000");
		assert_eq!(message["fee"]["amount"][0], json!({"amount": "1000", "denom": "stake"}));
		assert_eq!(message["fee"]["feePayer"], SIGNER);
		assert_eq!(message["msg1"], request.msgs[0].amino_json());

		let domain = &signed.typed_data.domain;
		assert_eq!(domain.verifying_contract, "");
		assert_eq!(domain.salt, "");
		assert_eq!(domain.chain_id, 9000);

		let extension = tx.web3_extension().unwrap();
		assert_eq!(extension.typed_data_chain_id, 9000);
		assert_eq!(extension.fee_payer, SIGNER);
		assert_eq!(extension.fee_payer_sig, signed.signature.to_vec());
		assert_eq!(signed.account_state.account_number, 12);
	}

	#[tokio::test]
	async fn test_signature_recovers_to_signer() {
		let signer = signer_with(working_ledger(), "test_9000-1");
		let signed = signer.sign(&request(None)).await.unwrap();

		assert!(matches!(signed.signature.v(), 27 | 28));
		assert_eq!(
			compute_typed_data_hash(&signed.typed_data).unwrap(),
			signed.hash
		);

		let recovered = recover_public_key(&signed.hash, &signed.signature).unwrap();
		assert_eq!(compressed_pub_key(&recovered), signer.identity().pub_key);
		assert_eq!(
			signed.tx.auth_info.signer_infos[0].public_key,
			signer.identity().pub_key
		);
	}

	#[tokio::test]
	async fn test_fee_delegation() {
		let signer = signer_with(working_ledger(), "test_9000-1");
		let signed = signer.sign(&request(Some("kava1payer"))).await.unwrap();

		let extension = signed.tx.web3_extension().unwrap();
		assert_eq!(extension.fee_payer, "kava1payer");
		assert_eq!(signed.typed_data.message["fee"]["feePayer"], "kava1payer");
		assert_eq!(signed.typed_data.domain.verifying_contract, "");
		assert_eq!(signed.typed_data.domain.salt, "");

		let recovered = recover_public_key(&signed.hash, &signed.signature).unwrap();
		assert_eq!(compressed_pub_key(&recovered), signer.identity().pub_key);
	}

	#[tokio::test]
	async fn test_multiple_messages_in_order() {
		let signer = signer_with(working_ledger(), "kava_2222-10");
		let mut request = request(None);
		request.msgs = vec![send_msg(1), send_msg(2), send_msg(3)];

		let signed = signer.sign(&request).await.unwrap();
		let registry = InterfaceRegistry::with_defaults();
		assert_eq!(signed.tx.messages(&registry).unwrap(), request.msgs);
		assert_eq!(signed.typed_data.message["msg3"], request.msgs[2].amino_json());
		assert_eq!(signed.tx.web3_extension().unwrap().typed_data_chain_id, 2222);
	}

	#[tokio::test]
	async fn test_malformed_chain_id() {
		let signer = signer_with(working_ledger(), "cosmoshub-4");
		let result = signer.sign(&request(None)).await;
		assert!(matches!(result, Err(SignError::ChainIdParse(_))));
	}

	#[tokio::test]
	async fn test_query_failure() {
		let mut ledger = MockLedger::new();
		ledger
			.expect_account()
			.returning(|_| Err(LedgerError::Network("connection refused".into())));
		ledger.expect_evm_params().returning(|| Ok(evm_params()));

		let result = signer_with(ledger, "test_9000-1").sign(&request(None)).await;
		assert!(matches!(result, Err(SignError::Query(_))));
	}

	#[tokio::test]
	async fn test_decode_failure() {
		let mut ledger = MockLedger::new();
		ledger.expect_account().returning(|_| {
			Ok(AccountRecord::from_tagged(json!({"@type": "/unknown.Account"})).unwrap())
		});
		ledger.expect_evm_params().returning(|| Ok(evm_params()));

		let result = signer_with(ledger, "test_9000-1").sign(&request(None)).await;
		assert!(matches!(result, Err(SignError::Decode(_))));
	}

	#[tokio::test]
	async fn test_unsupported_message() {
		let mut ledger = MockLedger::new();
		ledger.expect_account().returning(|_| Ok(account_record()));
		ledger
			.expect_evm_params()
			.returning(|| Ok(EvmParams::default()));

		let result = signer_with(ledger, "test_9000-1").sign(&request(None)).await;
		assert!(matches!(result, Err(SignError::UnsupportedMessage(t)) if t == SEND));
	}

	#[tokio::test]
	async fn test_amino_type_mismatch_rejected() {
		let mut ledger = MockLedger::new();
		ledger.expect_account().never();
		ledger.expect_evm_params().never();

		let mut request = request(None);
		request.msgs[0].amino_type = "cosmos-sdk/MsgBogus".to_string();

		let result = signer_with(ledger, "test_9000-1").sign(&request).await;
		assert!(matches!(result, Err(SignError::MessagePack(m)) if m.contains("cosmos-sdk/MsgBogus")));
	}

	#[tokio::test]
	async fn test_unregistered_message_rejected() {
		let mut ledger = MockLedger::new();
		ledger.expect_account().never();
		ledger.expect_evm_params().never();

		let mut request = request(None);
		request.msgs[0].type_url = "/x.MsgY".to_string();

		let result = signer_with(ledger, "test_9000-1").prepare(&request).await;
		assert!(matches!(result, Err(SignError::MessagePack(_))));
	}

	#[tokio::test]
	async fn test_undefined_value_type() {
		let mut ledger = MockLedger::new();
		ledger.expect_account().returning(|_| Ok(account_record()));
		ledger.expect_evm_params().returning(|| {
			let mut params = evm_params();
			params.eip712_allowed_msgs[0].value_types[2] =
				Eip712MsgAttrType::new("amount", "Undefined[]");
			Ok(params)
		});

		let result = signer_with(ledger, "test_9000-1").sign(&request(None)).await;
		assert!(matches!(result, Err(SignError::HashCompute(m)) if m.contains("Undefined")));
	}

	#[tokio::test]
	async fn test_account_state_fetched_per_request() {
		let mut ledger = MockLedger::new();
		ledger
			.expect_account()
			.times(2)
			.returning(|_| Ok(account_record()));
		ledger.expect_evm_params().times(2).returning(|| Ok(evm_params()));

		let signer = signer_with(ledger, "test_9000-1");
		let first = signer.prepare(&request(None)).await.unwrap();
		let second = signer.prepare(&request(None)).await.unwrap();
		assert_eq!(first.hash, second.hash);
	}
}
