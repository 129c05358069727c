//! Per-chain ordered provider lists.
//!
//! The registry is assembled once at startup and is read-only afterwards; wrap
//! it in an `Arc` to share it between connectors.

use crate::{DeliveryError, ExplorerProvider, ProviderError, ProviderInterface, RpcProvider};
use anchor_config::Config;
use anchor_types::Chain;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Immutable mapping from chain to providers in failover order.
pub struct ProviderRegistry {
	providers: HashMap<Chain, Vec<Arc<dyn ProviderInterface>>>,
}

impl ProviderRegistry {
	pub fn builder() -> ProviderRegistryBuilder {
		ProviderRegistryBuilder::default()
	}

	/// Builds the registry for every supported chain from configuration.
	///
	/// A chain with a configured node endpoint gets that node first; the
	/// explorer provider is always appended as the last resort.
	pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
		let timeout = config.broadcast.request_timeout();
		let fallback = config.gas.gas_price_fallback();
		let mut builder = Self::builder();

		for chain in Chain::ALL {
			if let Some(url) = config.rpc_url(chain) {
				builder = builder.with_provider(chain, Arc::new(RpcProvider::new(chain, url, timeout)?));
			}

			let token = config
				.explorers
				.token_for(chain.explorer())
				.unwrap_or_default();
			let explorer =
				ExplorerProvider::new(chain, token, timeout)?.with_gas_price_fallback(fallback);
			builder = builder.with_provider(chain, Arc::new(explorer));
		}

		Ok(builder.build())
	}

	/// Providers for `chain`, in the order they should be tried.
	pub fn providers_for(
		&self,
		chain: Chain,
	) -> Result<&[Arc<dyn ProviderInterface>], DeliveryError> {
		self.providers
			.get(&chain)
			.map(Vec::as_slice)
			.ok_or(DeliveryError::UnknownChain(chain))
	}
}

/// Collects providers before freezing them into a [`ProviderRegistry`].
#[derive(Default)]
pub struct ProviderRegistryBuilder {
	providers: HashMap<Chain, Vec<Arc<dyn ProviderInterface>>>,
}

impl ProviderRegistryBuilder {
	/// Appends `provider` to the failover order of `chain`.
	pub fn with_provider(mut self, chain: Chain, provider: Arc<dyn ProviderInterface>) -> Self {
		debug!("Registering provider {} for chain {}", provider.name(), chain);
		self.providers.entry(chain).or_default().push(provider);
		self
	}

	pub fn build(self) -> ProviderRegistry {
		for (chain, providers) in &self.providers {
			let names: Vec<&str> = providers.iter().map(|p| p.name()).collect();
			info!("Providers for {}: {}", chain, names.join(" -> "));
		}

		ProviderRegistry {
			providers: self.providers,
		}
	}
}
