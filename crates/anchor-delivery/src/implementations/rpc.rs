//! Direct JSON-RPC node provider.

use crate::{ProviderError, ProviderInterface};
use alloy::providers::{Provider, ProviderBuilder};
use anchor_types::{Address, Chain, SignedTransaction, TransactionId, U256};
use async_trait::async_trait;
use std::future::{Future, IntoFuture};
use std::time::Duration;
use tracing::debug;

/// Talks to a single Ethereum JSON-RPC endpoint over HTTP.
pub struct RpcProvider {
	name: String,
	provider: Box<dyn Provider>,
	timeout: Duration,
}

impl RpcProvider {
	pub fn new(chain: Chain, rpc_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
		let url = rpc_url
			.parse()
			.map_err(|e| ProviderError::Configuration(format!("Invalid RPC URL: {}", e)))?;
		let provider = ProviderBuilder::new().connect_http(url);

		Ok(Self {
			name: format!("RPC({})", chain),
			provider: Box::new(provider),
			timeout,
		})
	}

	async fn bounded<T, E, F>(&self, call: F) -> Result<T, ProviderError>
	where
		E: std::fmt::Display,
		F: Future<Output = Result<T, E>>,
	{
		match tokio::time::timeout(self.timeout, call).await {
			Ok(result) => result.map_err(|e| ProviderError::Network(e.to_string())),
			Err(_) => Err(ProviderError::Timeout(self.timeout)),
		}
	}
}

#[async_trait]
impl ProviderInterface for RpcProvider {
	fn name(&self) -> &str {
		&self.name
	}

	async fn get_balance(&self, address: Address) -> Result<U256, ProviderError> {
		self.bounded(self.provider.get_balance(address).into_future())
			.await
	}

	async fn get_gas_price(&self) -> Result<u128, ProviderError> {
		self.bounded(self.provider.get_gas_price().into_future())
			.await
	}

	async fn get_address_nonce(&self, address: Address) -> Result<u64, ProviderError> {
		self.bounded(self.provider.get_transaction_count(address).into_future())
			.await
	}

	async fn broadcast_tx(&self, tx: &SignedTransaction) -> Result<TransactionId, ProviderError> {
		let pending = self
			.bounded(self.provider.send_raw_transaction(tx.as_bytes()))
			.await?;
		let hash = pending.tx_hash();

		debug!("{} accepted transaction {}", self.name, hash);
		Ok(TransactionId::new(hash.to_string()))
	}
}
