//! Serde helpers for configuration deserialization

use anchor_types::Chain;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};

/// Deserializes a table keyed by chain config name (`polygon_mainnet = "..."`).
pub fn deserialize_chain_map<'de, D, T>(deserializer: D) -> Result<HashMap<Chain, T>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	let map = HashMap::<String, T>::deserialize(deserializer)?;

	map.into_iter()
		.map(|(k, v)| {
			k.parse::<Chain>()
				.map(|chain| (chain, v))
				.map_err(serde::de::Error::custom)
		})
		.collect()
}

/// Serializes a chain-keyed map back to config names, in stable order.
pub fn serialize_chain_map<S, T>(map: &HashMap<Chain, T>, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
	T: Serialize,
{
	let named: BTreeMap<&str, &T> = map.iter().map(|(k, v)| (k.config_name(), v)).collect();

	named.serialize(serializer)
}
