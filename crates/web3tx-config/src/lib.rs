//! Configuration module for the web3tx signer.
//!
//! Configuration is TOML. It names the target ledger chain, the EIP-712
//! domain the wallet signs under, and which ledger query and account
//! implementations to use, each with its own raw implementation section
//! validated later by that implementation's schema.
//!
//! ## Modular Configuration Support
//!
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Each top-level section must be unique across all files
//! - `${VAR}` and `${VAR:-default}` are replaced from the environment

mod loader;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use web3tx_types::parse_chain_id;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Configuration error: {0}")]
	Parse(String),
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message only, not the input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Target ledger chain.
	pub chain: ChainConfig,
	/// Ledger query implementations.
	pub ledger: LedgerConfig,
	/// Signing account implementations.
	pub account: AccountConfig,
}

/// Target ledger chain.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainConfig {
	/// Ledger chain identifier, e.g. `kava_2222-10`.
	pub chain_id: String,
	/// EIP-712 domain naming.
	#[serde(default)]
	pub eip712: Eip712DomainConfig,
}

/// Name and version of the EIP-712 domain shown by wallets.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Eip712DomainConfig {
	#[serde(default = "default_domain_name")]
	pub name: String,
	#[serde(default = "default_domain_version")]
	pub version: String,
}

impl Default for Eip712DomainConfig {
	fn default() -> Self {
		Self {
			name: default_domain_name(),
			version: default_domain_version(),
		}
	}
}

fn default_domain_name() -> String {
	"Kava Cosmos".to_string()
}

fn default_domain_version() -> String {
	"1.0.0".to_string()
}

/// Ledger query implementations.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
	/// Which implementation to use.
	pub primary: String,
	/// Raw configuration of each implementation, keyed by name.
	pub implementations: HashMap<String, toml::Value>,
}

/// Signing account implementations.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	/// Which implementation to use.
	pub primary: String,
	/// Raw configuration of each implementation, keyed by name.
	pub implementations: HashMap<String, toml::Value>,
}

/// Replaces `${VAR_NAME}` / `${VAR_NAME:-default}` with environment values.
///
/// Input strings are limited to 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last = 0;
	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match (std::env::var(var_name.as_str()), cap.get(2)) {
			(Ok(v), _) => v,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				return Err(ConfigError::Validation(format!(
					"Environment variable '{}' not found",
					var_name.as_str()
				)))
			},
		};
		result.push_str(&input[last..full_match.start()]);
		result.push_str(&value);
		last = full_match.end();
	}
	result.push_str(&input[last..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: &Path) -> Result<Self, ConfigError> {
		let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
		let file_name = path
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path.display())))?;

		let mut loader = loader::ConfigLoader::new(base_dir);
		loader.load_config(file_name).await
	}

	/// Checks cross-field constraints that serde cannot express.
	fn validate(&self) -> Result<(), ConfigError> {
		parse_chain_id(&self.chain.chain_id).map_err(|e| ConfigError::Validation(e.to_string()))?;

		if self.chain.eip712.name.is_empty() {
			return Err(ConfigError::Validation(
				"EIP-712 domain name cannot be empty".into(),
			));
		}

		validate_primary("ledger", &self.ledger.primary, &self.ledger.implementations)?;
		validate_primary(
			"account",
			&self.account.primary,
			&self.account.implementations,
		)?;

		Ok(())
	}
}

fn validate_primary(
	section: &str,
	primary: &str,
	implementations: &HashMap<String, toml::Value>,
) -> Result<(), ConfigError> {
	if implementations.is_empty() {
		return Err(ConfigError::Validation(format!(
			"At least one {} implementation must be configured",
			section
		)));
	}
	if primary.is_empty() {
		return Err(ConfigError::Validation(format!(
			"{} primary implementation cannot be empty",
			section
		)));
	}
	if !implementations.contains_key(primary) {
		return Err(ConfigError::Validation(format!(
			"Primary {} '{}' not found in implementations",
			section, primary
		)));
	}
	Ok(())
}

/// Parses and validates a configuration from a TOML string.
///
/// Environment variables are resolved before parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const CONFIG: &str = r#"
[chain]
chain_id = "kava_2222-10"

[ledger]
primary = "rest"
[ledger.implementations.rest]
url = "http://localhost:1317"

[account]
primary = "local"
[account.implementations.local]
private_key = "${WEB3TX_TEST_KEY:-0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80}"
hrp = "kava"
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("WEB3TX_TEST_HOST", "localhost");
		std::env::set_var("WEB3TX_TEST_PORT", "1317");

		let input = "url = \"http://${WEB3TX_TEST_HOST}:${WEB3TX_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "url = \"http://localhost:1317\"");

		std::env::remove_var("WEB3TX_TEST_HOST");
		std::env::remove_var("WEB3TX_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${WEB3TX_MISSING_VAR:-default_value}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"default_value\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let result = resolve_env_vars("value = \"${WEB3TX_MISSING_VAR}\"");
		assert!(result.unwrap_err().to_string().contains("WEB3TX_MISSING_VAR"));
	}

	#[test]
	fn test_parse_config() {
		let config: Config = CONFIG.parse().unwrap();
		assert_eq!(config.chain.chain_id, "kava_2222-10");
		assert_eq!(config.chain.eip712, Eip712DomainConfig::default());
		assert_eq!(config.ledger.primary, "rest");
		assert!(config.account.implementations["local"]
			.get("private_key")
			.and_then(|v| v.as_str())
			.is_some_and(|k| k.starts_with("0x")));
	}

	#[test]
	fn test_custom_domain() {
		let config: Config = CONFIG
			.replace(
				"chain_id = \"kava_2222-10\"",
				"chain_id = \"kava_2222-10\"\n[chain.eip712]\nname = \"Test Web3\"",
			)
			.parse()
			.unwrap();
		assert_eq!(config.chain.eip712.name, "Test Web3");
		assert_eq!(config.chain.eip712.version, "1.0.0");
	}

	#[test]
	fn test_invalid_chain_id_rejected() {
		let err = CONFIG
			.replace("kava_2222-10", "cosmoshub-4")
			.parse::<Config>()
			.unwrap_err();
		assert!(matches!(err, ConfigError::Validation(_)));
	}

	#[test]
	fn test_missing_primary_rejected() {
		let err = CONFIG
			.replace("primary = \"rest\"", "primary = \"grpc\"")
			.parse::<Config>()
			.unwrap_err();
		assert!(err.to_string().contains("Primary ledger 'grpc'"));
	}
}
