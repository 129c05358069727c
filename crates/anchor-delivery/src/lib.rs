//! Blockchain access for the issuer.
//!
//! Providers talk to one backend each (a JSON-RPC node or an explorer REST
//! API). The [`ProviderRegistry`] orders them per chain, and the
//! [`FailoverConnector`] walks that order so a single unhealthy backend never
//! blocks issuance.

use anchor_types::{Address, Chain, SignedTransaction, TransactionId, U256};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub mod connector;
pub mod registry;

pub mod implementations {
	pub mod explorer;
	pub mod rpc;
}

pub use connector::{BroadcastPolicy, FailoverConnector};
pub use implementations::explorer::ExplorerProvider;
pub use implementations::rpc::RpcProvider;
pub use registry::{ProviderRegistry, ProviderRegistryBuilder};

/// Failure of a single provider call. Always recoverable by trying another
/// provider.
#[derive(Debug, Error)]
pub enum ProviderError {
	#[error("Network error: {0}")]
	Network(String),
	#[error("Request timed out after {0:?}")]
	Timeout(Duration),
	#[error("Provider rejected request: {0}")]
	Rejected(String),
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
	#[error("Invalid provider configuration: {0}")]
	Configuration(String),
}

#[derive(Debug, Error)]
pub enum DeliveryError {
	#[error("No providers registered for chain {0}")]
	UnknownChain(Chain),
	#[error("Transaction was not accepted by any provider after {attempts} attempts")]
	Broadcast { attempts: u32 },
	#[error("Broadcast cancelled after {attempts} attempts")]
	Cancelled { attempts: u32 },
}

/// One backend able to read chain state and relay signed transactions.
#[async_trait]
pub trait ProviderInterface: Send + Sync {
	/// Human readable name used in logs.
	fn name(&self) -> &str;

	/// Balance of `address` in wei.
	async fn get_balance(&self, address: Address) -> Result<U256, ProviderError>;

	/// Current gas price in wei.
	async fn get_gas_price(&self) -> Result<u128, ProviderError>;

	/// Transaction count of `address` at the latest block.
	async fn get_address_nonce(&self, address: Address) -> Result<u64, ProviderError>;

	/// Relays a signed transaction and returns its hash.
	async fn broadcast_tx(&self, tx: &SignedTransaction) -> Result<TransactionId, ProviderError>;
}
