//! Configuration types for the issuer.

use crate::serde_helpers::{deserialize_chain_map, serialize_chain_map};
use anchor_types::{Chain, ExplorerFamily, WEI_PER_GWEI};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Gas price assumed when an explorer cannot report one (20 Gwei).
pub const DEFAULT_FALLBACK_GAS_PRICE: u64 = 20 * WEI_PER_GWEI as u64;

/// Complete issuer configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Issuing identity and target chain
	pub issuer: IssuerConfig,
	/// Fee parameters
	#[serde(default)]
	pub gas: GasConfig,
	/// Broadcast retry policy and request timeouts
	#[serde(default)]
	pub broadcast: BroadcastConfig,
	/// Explorer API tokens
	#[serde(default)]
	pub explorers: ExplorerConfig,
	/// Direct node endpoints, keyed by chain config name
	#[serde(
		default,
		deserialize_with = "deserialize_chain_map",
		serialize_with = "serialize_chain_map"
	)]
	pub rpc: HashMap<Chain, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IssuerConfig {
	/// Address that pays for and receives anchoring transactions
	pub issuing_address: String,
	/// Target network
	pub chain: Chain,
	/// Operator nonce override; 0 means "use the on-chain nonce"
	#[serde(default)]
	pub nonce: u64,
	/// File whose first line holds the hex private key
	pub key_file: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GasConfig {
	/// Static gas price in wei
	pub gas_price: u64,
	/// Query the gas price from the providers instead of using `gas_price`
	pub gas_price_dynamic: bool,
	pub gas_limit: u64,
	/// Priority fee in wei; 0 selects legacy transactions
	pub max_priority_fee_per_gas: u64,
	/// Gas price explorers report when their gas oracle fails
	pub fallback_gas_price: u64,
	/// When false, a failing gas oracle is an error instead of a fallback
	pub use_fallback_gas_price: bool,
}

impl Default for GasConfig {
	fn default() -> Self {
		Self {
			gas_price: DEFAULT_FALLBACK_GAS_PRICE,
			gas_price_dynamic: false,
			gas_limit: 25_000,
			max_priority_fee_per_gas: 0,
			fallback_gas_price: DEFAULT_FALLBACK_GAS_PRICE,
			use_fallback_gas_price: true,
		}
	}
}

impl GasConfig {
	/// Fallback gas price handed to explorer providers, if enabled.
	pub fn gas_price_fallback(&self) -> Option<u128> {
		self.use_fallback_gas_price
			.then_some(self.fallback_gas_price as u128)
	}
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BroadcastConfig {
	/// Full provider-list scans before giving up
	pub max_attempts: u32,
	/// Pause between failed scans
	pub retry_interval_secs: u64,
	/// Upper bound for any single provider request
	pub request_timeout_secs: u64,
}

impl Default for BroadcastConfig {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			retry_interval_secs: 30,
			request_timeout_secs: 30,
		}
	}
}

impl BroadcastConfig {
	pub fn retry_interval(&self) -> Duration {
		Duration::from_secs(self.retry_interval_secs)
	}

	pub fn request_timeout(&self) -> Duration {
		Duration::from_secs(self.request_timeout_secs)
	}
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExplorerConfig {
	pub polygonscan_api_token: Option<String>,
	pub arbiscan_api_token: Option<String>,
	pub optimistic_etherscan_api_token: Option<String>,
}

impl ExplorerConfig {
	pub fn token_for(&self, family: ExplorerFamily) -> Option<&str> {
		let token = match family {
			ExplorerFamily::Polygonscan => &self.polygonscan_api_token,
			ExplorerFamily::Arbiscan => &self.arbiscan_api_token,
			ExplorerFamily::OptimisticEtherscan => &self.optimistic_etherscan_api_token,
		};
		token.as_deref().filter(|t| !t.is_empty())
	}

	pub(crate) fn token_mut(&mut self, family: ExplorerFamily) -> &mut Option<String> {
		match family {
			ExplorerFamily::Polygonscan => &mut self.polygonscan_api_token,
			ExplorerFamily::Arbiscan => &mut self.arbiscan_api_token,
			ExplorerFamily::OptimisticEtherscan => &mut self.optimistic_etherscan_api_token,
		}
	}
}

impl Config {
	/// Direct node endpoint configured for `chain`, if any.
	pub fn rpc_url(&self, chain: Chain) -> Option<&str> {
		self.rpc.get(&chain).map(String::as_str).filter(|u| !u.is_empty())
	}
}
