//! Serde adapter rendering byte vectors as 0x-prefixed hex strings.

use super::formatting::without_0x_prefix;
use serde::{Deserialize, Deserializer, Serializer};

pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
	D: Deserializer<'de>,
{
	let s = String::deserialize(deserializer)?;
	hex::decode(without_0x_prefix(&s)).map_err(serde::de::Error::custom)
}
