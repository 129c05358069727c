//! Chain catalogue.
//!
//! The set of networks an issuer can anchor to is closed: every chain carries
//! its EIP-155 network id, whether it accepts EIP-1559 fee-market
//! transactions, and the explorer API that always backs it as a fallback.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Raised when a chain name is not part of the catalogue.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown chain: {0}")]
pub struct UnknownChainError(pub String);

/// Supported Layer-2 networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chain {
	PolygonMainnet,
	PolygonMumbai,
	ArbitrumOne,
	ArbitrumGoerli,
	OptimismMainnet,
	OptimismGoerli,
}

/// Block-explorer API family backing a chain.
///
/// All families speak the same `{module, action, apikey}` request envelope
/// and `{status, message, result}` response envelope; they differ only in
/// host and in which API token they are gated by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplorerFamily {
	Polygonscan,
	Arbiscan,
	OptimisticEtherscan,
}

impl Chain {
	/// Every chain in the catalogue, in registry order.
	pub const ALL: [Chain; 6] = [
		Chain::PolygonMainnet,
		Chain::PolygonMumbai,
		Chain::ArbitrumOne,
		Chain::ArbitrumGoerli,
		Chain::OptimismMainnet,
		Chain::OptimismGoerli,
	];

	/// EIP-155 network id used for replay protection at signing time.
	pub fn chain_id(&self) -> u64 {
		match self {
			Chain::PolygonMainnet => 137,
			Chain::PolygonMumbai => 80001,
			Chain::ArbitrumOne => 42161,
			Chain::ArbitrumGoerli => 421613,
			Chain::OptimismMainnet => 10,
			Chain::OptimismGoerli => 420,
		}
	}

	pub fn explorer(&self) -> ExplorerFamily {
		match self {
			Chain::PolygonMainnet | Chain::PolygonMumbai => ExplorerFamily::Polygonscan,
			Chain::ArbitrumOne | Chain::ArbitrumGoerli => ExplorerFamily::Arbiscan,
			Chain::OptimismMainnet | Chain::OptimismGoerli => ExplorerFamily::OptimisticEtherscan,
		}
	}

	/// Base URL of the explorer API for this network.
	pub fn explorer_base_url(&self) -> &'static str {
		match self {
			Chain::PolygonMainnet => "https://api.polygonscan.com/api",
			Chain::PolygonMumbai => "https://api-testnet.polygonscan.com/api",
			Chain::ArbitrumOne => "https://api.arbiscan.io/api",
			Chain::ArbitrumGoerli => "https://api-goerli.arbiscan.io/api",
			Chain::OptimismMainnet => "https://api-optimistic.etherscan.io/api",
			Chain::OptimismGoerli => "https://api-goerli-optimistic.etherscan.io/api",
		}
	}

	/// Name used in configuration files.
	pub fn config_name(&self) -> &'static str {
		match self {
			Chain::PolygonMainnet => "polygon_mainnet",
			Chain::PolygonMumbai => "polygon_mumbai",
			Chain::ArbitrumOne => "arbitrum_one",
			Chain::ArbitrumGoerli => "arbitrum_goerli",
			Chain::OptimismMainnet => "optimism_mainnet",
			Chain::OptimismGoerli => "optimism_goerli",
		}
	}

	/// Name shown in issued credentials and logs.
	pub fn display_name(&self) -> &'static str {
		match self {
			Chain::PolygonMainnet => "polygonMainnet",
			Chain::PolygonMumbai => "polygonMumbai",
			Chain::ArbitrumOne => "arbitrumOne",
			Chain::ArbitrumGoerli => "arbitrumGoerli",
			Chain::OptimismMainnet => "optimismMainnet",
			Chain::OptimismGoerli => "optimismGoerli",
		}
	}
}

impl ExplorerFamily {
	pub fn name(&self) -> &'static str {
		match self {
			ExplorerFamily::Polygonscan => "Polygonscan",
			ExplorerFamily::Arbiscan => "Arbiscan",
			ExplorerFamily::OptimisticEtherscan => "Optimistic Etherscan",
		}
	}

	/// Configuration key holding the API token for this family.
	pub fn token_key(&self) -> &'static str {
		match self {
			ExplorerFamily::Polygonscan => "polygonscan_api_token",
			ExplorerFamily::Arbiscan => "arbiscan_api_token",
			ExplorerFamily::OptimisticEtherscan => "optimistic_etherscan_api_token",
		}
	}
}

impl fmt::Display for Chain {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.display_name())
	}
}

impl fmt::Display for ExplorerFamily {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.name())
	}
}

impl FromStr for Chain {
	type Err = UnknownChainError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Chain::ALL
			.into_iter()
			.find(|chain| chain.config_name() == s || chain.display_name() == s)
			.ok_or_else(|| UnknownChainError(s.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_chain_ids() {
		assert_eq!(Chain::PolygonMainnet.chain_id(), 137);
		assert_eq!(Chain::PolygonMumbai.chain_id(), 80001);
		assert_eq!(Chain::ArbitrumOne.chain_id(), 42161);
		assert_eq!(Chain::ArbitrumGoerli.chain_id(), 421613);
		assert_eq!(Chain::OptimismMainnet.chain_id(), 10);
		assert_eq!(Chain::OptimismGoerli.chain_id(), 420);
	}

	#[test]
	fn test_parse_config_and_display_names() {
		assert_eq!("arbitrum_one".parse::<Chain>(), Ok(Chain::ArbitrumOne));
		assert_eq!("optimismGoerli".parse::<Chain>(), Ok(Chain::OptimismGoerli));
		assert_eq!(
			"bitcoin_mainnet".parse::<Chain>(),
			Err(UnknownChainError("bitcoin_mainnet".to_string()))
		);

		for chain in Chain::ALL {
			assert_eq!(chain.config_name().parse::<Chain>(), Ok(chain));
			assert_eq!(chain.to_string().parse::<Chain>(), Ok(chain));
		}
	}

	#[test]
	fn test_explorer_families() {
		assert_eq!(Chain::PolygonMumbai.explorer(), ExplorerFamily::Polygonscan);
		assert_eq!(Chain::ArbitrumGoerli.explorer(), ExplorerFamily::Arbiscan);
		assert_eq!(
			Chain::OptimismMainnet.explorer(),
			ExplorerFamily::OptimisticEtherscan
		);
		assert_eq!(
			ExplorerFamily::Arbiscan.token_key(),
			"arbiscan_api_token"
		);
	}

	#[test]
	fn test_serde_uses_config_names() {
		#[derive(Deserialize)]
		struct Wrapper {
			chain: Chain,
		}

		let parsed: Wrapper = toml::from_str("chain = \"polygon_mumbai\"").unwrap();
		assert_eq!(parsed.chain, Chain::PolygonMumbai);
	}
}
