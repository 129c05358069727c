//! Failover across the providers registered for one chain.
//!
//! Reads walk the provider list and degrade to `0` when nothing answers, so
//! callers treat a zero as "unknown". Broadcasting is retried in whole passes
//! over the list with a constant pause between passes.

use crate::{DeliveryError, ProviderError, ProviderInterface, ProviderRegistry};
use anchor_config::BroadcastConfig;
use anchor_types::{Address, BroadcastOutcome, Chain, SignedTransaction, TransactionId, U256};
use backoff::backoff::{Backoff, Constant};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// How hard the connector tries to get a transaction accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastPolicy {
	/// Full passes over the provider list.
	pub max_attempts: u32,
	/// Pause between failed passes.
	pub retry_interval: Duration,
}

impl Default for BroadcastPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			retry_interval: Duration::from_secs(30),
		}
	}
}

impl From<&BroadcastConfig> for BroadcastPolicy {
	fn from(config: &BroadcastConfig) -> Self {
		Self {
			max_attempts: config.max_attempts,
			retry_interval: config.retry_interval(),
		}
	}
}

pub struct FailoverConnector {
	chain: Chain,
	registry: Arc<ProviderRegistry>,
	policy: BroadcastPolicy,
	cancel: Option<watch::Receiver<bool>>,
}

impl FailoverConnector {
	pub fn new(chain: Chain, registry: Arc<ProviderRegistry>, policy: BroadcastPolicy) -> Self {
		Self {
			chain,
			registry,
			policy,
			cancel: None,
		}
	}

	/// Stops pending broadcast retries once `cancel` turns `true`.
	pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
		self.cancel = Some(cancel);
		self
	}

	pub fn chain(&self) -> Chain {
		self.chain
	}

	/// Balance of `address` in wei, or zero when no provider answers.
	pub async fn get_balance(&self, address: Address) -> U256 {
		self.first_success("balance", |p| async move { p.get_balance(address).await })
			.await
			.unwrap_or(U256::ZERO)
	}

	/// Gas price in wei, or zero when no provider answers.
	pub async fn gas_price(&self) -> u128 {
		self.first_success("gas price", |p| async move { p.get_gas_price().await })
			.await
			.unwrap_or(0)
	}

	/// Latest transaction count of `address`, or zero when no provider answers.
	pub async fn get_address_nonce(&self, address: Address) -> u64 {
		self.first_success("nonce", |p| async move {
			p.get_address_nonce(address).await
		})
		.await
		.unwrap_or(0)
	}

	async fn first_success<T, F, Fut>(&self, what: &str, query: F) -> Option<T>
	where
		F: Fn(Arc<dyn ProviderInterface>) -> Fut,
		Fut: Future<Output = Result<T, ProviderError>>,
	{
		let providers = match self.registry.providers_for(self.chain) {
			Ok(providers) => providers,
			Err(e) => {
				warn!("Cannot query {}: {}", what, e);
				return None;
			}
		};

		for (provider_idx, provider) in providers.iter().enumerate() {
			match query(provider.clone()).await {
				Ok(value) => {
					debug!(provider = provider.name(), "Fetched {}", what);
					return Some(value);
				}
				Err(e) => {
					warn!(
						provider_idx,
						provider = provider.name(),
						"Failed to fetch {}: {}",
						what,
						e
					);
				}
			}
		}

		warn!("No provider returned {} for {}", what, self.chain);
		None
	}

	/// Relays `tx` through the first provider that accepts it.
	///
	/// Each attempt is a full pass over the provider list. Attempts are
	/// separated by the policy's retry interval; there is no pause after the
	/// final one.
	pub async fn broadcast_tx(&self, tx: &SignedTransaction) -> Result<TransactionId, DeliveryError> {
		let providers = self.registry.providers_for(self.chain)?;
		let max_attempts = self.policy.max_attempts.max(1);
		let mut backoff = Constant::new(self.policy.retry_interval);
		let mut cancel = self.cancel.clone();

		for attempt in 1..=max_attempts {
			if is_cancelled(&cancel) {
				warn!("Broadcast cancelled before attempt {}", attempt);
				return Err(DeliveryError::Cancelled {
					attempts: attempt - 1,
				});
			}

			for provider in providers {
				let outcome = BroadcastOutcome {
					attempt,
					provider: provider.name().to_string(),
					result: provider.broadcast_tx(tx).await.map_err(|e| e.to_string()),
				};

				match outcome.result {
					Ok(ref txid) => {
						info!("Broadcast {}", outcome);
						return Ok(txid.clone());
					}
					Err(_) => warn!("Broadcast {}", outcome),
				}
			}

			if attempt < max_attempts {
				let delay = backoff
					.next_backoff()
					.unwrap_or(self.policy.retry_interval);
				info!(
					"Broadcast attempt {}/{} failed, retrying in {:?}",
					attempt, max_attempts, delay
				);

				if sleep_or_cancel(&mut cancel, delay).await {
					warn!("Broadcast cancelled after attempt {}", attempt);
					return Err(DeliveryError::Cancelled { attempts: attempt });
				}
			}
		}

		error!(
			"Transaction not accepted by any {} provider after {} attempts",
			self.chain, max_attempts
		);
		Err(DeliveryError::Broadcast {
			attempts: max_attempts,
		})
	}
}

fn is_cancelled(cancel: &Option<watch::Receiver<bool>>) -> bool {
	cancel.as_ref().is_some_and(|rx| *rx.borrow())
}

/// Sleeps for `delay`; returns `true` if cancellation fired first.
async fn sleep_or_cancel(cancel: &mut Option<watch::Receiver<bool>>, delay: Duration) -> bool {
	match cancel {
		Some(rx) => {
			tokio::select! {
				_ = tokio::time::sleep(delay) => false,
				Ok(_) = rx.wait_for(|cancelled| *cancelled) => true,
			}
		}
		None => {
			tokio::time::sleep(delay).await;
			false
		}
	}
}
