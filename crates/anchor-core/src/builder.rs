//! Assembly of unsigned anchoring transactions.

use crate::cost::CostConstants;
use anchor_delivery::FailoverConnector;
use anchor_types::{Address, FeeShape, UnsignedTransaction, U256};
use std::sync::Arc;
use tracing::debug;

/// Builds zero-value self-transfers that carry the anchored payload as data.
pub struct TransactionBuilder {
	connector: Arc<FailoverConnector>,
	nonce_override: u64,
}

impl TransactionBuilder {
	/// `nonce_override` of zero means the nonce is read from the chain.
	pub fn new(connector: Arc<FailoverConnector>, nonce_override: u64) -> Self {
		Self {
			connector,
			nonce_override,
		}
	}

	pub async fn create_transaction(
		&self,
		cost: &CostConstants,
		issuing_address: Address,
		payload: &[u8],
	) -> UnsignedTransaction {
		let nonce = if self.nonce_override > 0 {
			self.nonce_override
		} else {
			self.connector.get_address_nonce(issuing_address).await
		};

		let fee = match cost.max_priority_fee_per_gas() {
			Some(priority) => FeeShape::FeeMarket {
				max_fee_per_gas: cost.gas_price(),
				max_priority_fee_per_gas: priority,
			},
			None => FeeShape::Legacy {
				gas_price: cost.gas_price(),
			},
		};

		let tx = UnsignedTransaction {
			from: issuing_address,
			to: issuing_address,
			value: U256::ZERO,
			data: payload.to_vec().into(),
			gas_limit: cost.gas_limit(),
			nonce,
			fee,
		};

		debug!("Created transaction {}", tx);
		tx
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_utils::{connector_with, StubProvider};

	fn issuer() -> Address {
		Address::repeat_byte(0x42)
	}

	#[tokio::test]
	async fn test_legacy_transaction_uses_queried_nonce() {
		let provider = StubProvider::new().with_nonce(9);
		let builder = TransactionBuilder::new(connector_with(provider), 0);
		let cost = CostConstants::new(0, 30_000_000_000, 25_000).unwrap();

		let tx = builder
			.create_transaction(&cost, issuer(), &[0xca, 0xfe])
			.await;

		assert_eq!(tx.from, issuer());
		assert_eq!(tx.to, issuer());
		assert_eq!(tx.value, U256::ZERO);
		assert_eq!(tx.data.as_ref(), &[0xca, 0xfe]);
		assert_eq!(tx.gas_limit, 25_000);
		assert_eq!(tx.nonce, 9);
		assert_eq!(
			tx.fee,
			FeeShape::Legacy {
				gas_price: 30_000_000_000
			}
		);
		assert_eq!(tx.fee.max_priority_fee_per_gas(), None);
	}

	#[tokio::test]
	async fn test_fee_market_transaction() {
		let builder = TransactionBuilder::new(connector_with(StubProvider::new()), 0);
		let cost = CostConstants::new(1_000_000_000, 30_000_000_000, 25_000).unwrap();

		let tx = builder.create_transaction(&cost, issuer(), &[]).await;

		assert_eq!(
			tx.fee,
			FeeShape::FeeMarket {
				max_fee_per_gas: 30_000_000_000,
				max_priority_fee_per_gas: 1_000_000_000
			}
		);
		assert_eq!(tx.fee.gas_price(), None);
	}

	#[tokio::test]
	async fn test_nonce_override_skips_provider() {
		let provider = StubProvider::new().with_nonce(9);
		let calls = provider.nonce_calls();
		let builder = TransactionBuilder::new(connector_with(provider), 42);
		let cost = CostConstants::new(0, 1, 25_000).unwrap();

		let tx = builder.create_transaction(&cost, issuer(), &[]).await;

		assert_eq!(tx.nonce, 42);
		assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn test_unreachable_providers_yield_nonce_zero() {
		let builder = TransactionBuilder::new(connector_with(StubProvider::new().down()), 0);
		let cost = CostConstants::new(0, 1, 25_000).unwrap();

		let tx = builder.create_transaction(&cost, issuer(), &[]).await;
		assert_eq!(tx.nonce, 0);
	}
}
