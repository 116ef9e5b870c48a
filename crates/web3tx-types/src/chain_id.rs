//! Ledger chain identifier parsing.
//!
//! EVM-enabled ledgers name their chains `{identifier}_{epoch}-{revision}`,
//! for example `kava_2222-10`. The `epoch` segment is the EIP-155 chain id
//! that wallets sign against.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Maximum length of a ledger chain identifier.
pub const MAX_CHAIN_ID_LEN: usize = 48;

/// Numeric EVM chain id extracted from a ledger chain identifier.
pub type EvmChainId = u64;

/// Errors that can occur while parsing a chain identifier.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainIdError {
	#[error("chain-id cannot be empty")]
	Empty,
	#[error("chain-id '{0}' cannot exceed 48 chars")]
	TooLong(String),
	#[error("chain-id '{0}' does not match expected format {{identifier}}_{{EIP155}}-{{epoch}}")]
	InvalidFormat(String),
	#[error("chain-id '{0}' has an EIP-155 segment that does not fit in 64 bits")]
	Overflow(String),
}

fn chain_id_regex() -> Option<&'static Regex> {
	static RE: OnceLock<Option<Regex>> = OnceLock::new();
	RE.get_or_init(|| Regex::new(r"^([a-z]{1,})_([1-9][0-9]*)-([1-9][0-9]*)$").ok())
		.as_ref()
}

/// Parses a ledger chain identifier into its numeric EVM chain id.
///
/// Surrounding whitespace is ignored.
pub fn parse_chain_id(chain_id: &str) -> Result<EvmChainId, ChainIdError> {
	let chain_id = chain_id.trim();
	if chain_id.is_empty() {
		return Err(ChainIdError::Empty);
	}
	if chain_id.len() > MAX_CHAIN_ID_LEN {
		return Err(ChainIdError::TooLong(chain_id.to_string()));
	}

	let captures = chain_id_regex()
		.and_then(|re| re.captures(chain_id))
		.ok_or_else(|| ChainIdError::InvalidFormat(chain_id.to_string()))?;
	let epoch = captures
		.get(2)
		.ok_or_else(|| ChainIdError::InvalidFormat(chain_id.to_string()))?;

	epoch
		.as_str()
		.parse::<u64>()
		.map_err(|_| ChainIdError::Overflow(chain_id.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_valid_chain_ids() {
		assert_eq!(parse_chain_id("test_9000-1"), Ok(9000));
		assert_eq!(parse_chain_id("kava_2222-10"), Ok(2222));
		assert_eq!(parse_chain_id("  evmos_9001-2 "), Ok(9001));
	}

	#[test]
	fn test_parse_invalid_chain_ids() {
		assert_eq!(parse_chain_id(""), Err(ChainIdError::Empty));
		assert!(matches!(
			parse_chain_id("cosmoshub-4"),
			Err(ChainIdError::InvalidFormat(_))
		));
		assert!(matches!(
			parse_chain_id("test_0900-1"),
			Err(ChainIdError::InvalidFormat(_))
		));
		assert!(matches!(
			parse_chain_id("Test_9000-1"),
			Err(ChainIdError::InvalidFormat(_))
		));
		assert!(matches!(
			parse_chain_id("test_9000"),
			Err(ChainIdError::InvalidFormat(_))
		));
	}

	#[test]
	fn test_parse_overflow_and_length() {
		assert!(matches!(
			parse_chain_id("test_99999999999999999999-1"),
			Err(ChainIdError::Overflow(_))
		));
		let long = format!("{}_1-1", "a".repeat(MAX_CHAIN_ID_LEN));
		assert!(matches!(parse_chain_id(&long), Err(ChainIdError::TooLong(_))));
	}
}
