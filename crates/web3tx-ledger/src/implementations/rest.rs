//! REST (LCD) ledger query implementation.
//!
//! Reads accounts and EVM parameters from the ledger's HTTP gateway:
//!
//! - `GET {url}/cosmos/auth/v1beta1/accounts/{address}`
//! - `GET {url}/ethermint/evm/v1/params`

use crate::{LedgerError, LedgerFactory, LedgerQueryInterface, LedgerRegistry};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use web3tx_types::{
	AccountRecord, ConfigSchema, EvmParams, Field, FieldType, ImplementationRegistry, Schema,
	ValidationError,
};

/// Request timeout used when the configuration does not set one.
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[derive(Debug, Deserialize)]
struct AccountResponse {
	account: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ParamsResponse {
	params: EvmParams,
}

/// Ledger queries over the REST gateway.
pub struct RestLedger {
	client: reqwest::Client,
	url: String,
}

impl RestLedger {
	/// Creates a client for the gateway at `url`.
	pub fn new(url: &str, timeout: Duration) -> Result<Self, LedgerError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| LedgerError::Network(format!("Failed to build HTTP client: {}", e)))?;

		Ok(Self {
			client,
			url: url.trim_end_matches('/').to_string(),
		})
	}

	async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, LedgerError> {
		let url = format!("{}{}", self.url, path);
		tracing::debug!(url = %url, "Querying ledger");

		let response = self
			.client
			.get(&url)
			.send()
			.await
			.map_err(|e| LedgerError::Network(format!("GET {} failed: {}", url, e)))?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().await.unwrap_or_default();
			return Err(LedgerError::Network(format!(
				"GET {} returned {}: {}",
				url, status, body
			)));
		}

		response
			.json::<T>()
			.await
			.map_err(|e| LedgerError::Decode(format!("Invalid response from {}: {}", url, e)))
	}
}

#[async_trait]
impl LedgerQueryInterface for RestLedger {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(RestLedgerSchema)
	}

	async fn account(&self, address: &str) -> Result<AccountRecord, LedgerError> {
		if address.is_empty() || !address.chars().all(|c| c.is_ascii_alphanumeric()) {
			return Err(LedgerError::InvalidRequest(format!(
				"Invalid ledger address '{}'",
				address
			)));
		}

		let response: AccountResponse = self
			.get_json(&format!("/cosmos/auth/v1beta1/accounts/{}", address))
			.await?;
		AccountRecord::from_tagged(response.account)
			.ok_or_else(|| LedgerError::Decode("Account record has no '@type' tag".into()))
	}

	async fn evm_params(&self) -> Result<EvmParams, LedgerError> {
		let response: ParamsResponse = self.get_json("/ethermint/evm/v1/params").await?;
		Ok(response.params)
	}
}

/// Configuration schema for the REST ledger.
pub struct RestLedgerSchema;

impl RestLedgerSchema {
	/// Static validation method for use before instance creation
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		RestLedgerSchema.validate(config)
	}
}

impl ConfigSchema for RestLedgerSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("url", FieldType::String).with_validator(|value| {
				match value.as_str() {
					Some(url) if url.starts_with("http://") || url.starts_with("https://") => Ok(()),
					_ => Err("url must start with http:// or https://".to_string()),
				}
			})],
			vec![Field::new(
				"timeout_seconds",
				FieldType::Integer {
					min: Some(1),
					max: Some(300),
				},
			)],
		);
		schema.validate(config)
	}
}

/// Factory function to create a REST ledger from configuration.
///
/// Configuration parameters:
/// - `url`: base URL of the REST gateway
/// - `timeout_seconds`: per-request timeout (optional, default: 30)
pub fn create_ledger(config: &toml::Value) -> Result<Box<dyn LedgerQueryInterface>, LedgerError> {
	RestLedgerSchema::validate_config(config)
		.map_err(|e| LedgerError::InvalidRequest(format!("Invalid configuration: {}", e)))?;

	let url = config
		.get("url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| LedgerError::InvalidRequest("url is required".into()))?;
	let timeout_seconds = config
		.get("timeout_seconds")
		.and_then(|v| v.as_integer())
		.map(|v| v as u64)
		.unwrap_or(DEFAULT_TIMEOUT_SECONDS);

	Ok(Box::new(RestLedger::new(
		url,
		Duration::from_secs(timeout_seconds),
	)?))
}

/// Registry for the REST ledger implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "rest";
	type Factory = LedgerFactory;

	fn factory() -> Self::Factory {
		create_ledger
	}
}

impl LedgerRegistry for Registry {}
