//! Shared fixtures for handler and builder tests.

use anchor_account::{AccountError, KeyAccess, SecretManager, TransactionSigner};
use anchor_delivery::{
	BroadcastPolicy, FailoverConnector, ProviderError, ProviderInterface, ProviderRegistry,
};
use anchor_types::{Address, Chain, SignedTransaction, TransactionId, UnsignedTransaction, U256};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use zeroize::Zeroizing;

// Well-known development key (first account of the default test mnemonic).
pub const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub fn test_address() -> Address {
	TEST_KEY
		.trim_start_matches("0x")
		.parse::<alloy::signers::local::PrivateKeySigner>()
		.unwrap()
		.address()
}

pub struct StubProvider {
	balance: U256,
	nonce: u64,
	gas_price: u128,
	up: bool,
	accepts: bool,
	nonce_calls: Arc<AtomicU32>,
	broadcasts: Arc<AtomicU32>,
}

impl StubProvider {
	pub fn new() -> Self {
		Self {
			balance: U256::from(10u64.pow(18)),
			nonce: 0,
			gas_price: 30_000_000_000,
			up: true,
			accepts: true,
			nonce_calls: Arc::new(AtomicU32::new(0)),
			broadcasts: Arc::new(AtomicU32::new(0)),
		}
	}

	pub fn with_balance(mut self, balance: u64) -> Self {
		self.balance = U256::from(balance);
		self
	}

	pub fn with_gas_price(mut self, gas_price: u128) -> Self {
		self.gas_price = gas_price;
		self
	}

	pub fn with_nonce(mut self, nonce: u64) -> Self {
		self.nonce = nonce;
		self
	}

	pub fn down(mut self) -> Self {
		self.up = false;
		self
	}

	pub fn rejecting(mut self) -> Self {
		self.accepts = false;
		self
	}

	pub fn nonce_calls(&self) -> Arc<AtomicU32> {
		self.nonce_calls.clone()
	}

	pub fn broadcasts(&self) -> Arc<AtomicU32> {
		self.broadcasts.clone()
	}

	fn check(&self) -> Result<(), ProviderError> {
		if self.up {
			Ok(())
		} else {
			Err(ProviderError::Network("stub is down".to_string()))
		}
	}
}

#[async_trait]
impl ProviderInterface for StubProvider {
	fn name(&self) -> &str {
		"stub"
	}

	async fn get_balance(&self, _address: Address) -> Result<U256, ProviderError> {
		self.check().map(|_| self.balance)
	}

	async fn get_gas_price(&self) -> Result<u128, ProviderError> {
		self.check().map(|_| self.gas_price)
	}

	async fn get_address_nonce(&self, _address: Address) -> Result<u64, ProviderError> {
		self.nonce_calls.fetch_add(1, Ordering::SeqCst);
		self.check().map(|_| self.nonce)
	}

	async fn broadcast_tx(&self, _tx: &SignedTransaction) -> Result<TransactionId, ProviderError> {
		self.broadcasts.fetch_add(1, Ordering::SeqCst);
		if self.up && self.accepts {
			Ok(TransactionId::new("0xabc123"))
		} else {
			Err(ProviderError::Rejected("stub rejects transactions".to_string()))
		}
	}
}

pub fn connector_with(provider: StubProvider) -> Arc<FailoverConnector> {
	let registry = ProviderRegistry::builder()
		.with_provider(Chain::PolygonMumbai, Arc::new(provider))
		.build();

	Arc::new(FailoverConnector::new(
		Chain::PolygonMumbai,
		Arc::new(registry),
		BroadcastPolicy::default(),
	))
}

/// Signer that always fails.
pub struct BrokenSigner;

#[async_trait]
impl TransactionSigner for BrokenSigner {
	async fn sign_transaction(
		&self,
		_private_key: &str,
		_tx: &UnsignedTransaction,
		_chain_id: u64,
	) -> Result<SignedTransaction, AccountError> {
		Err(AccountError::SigningFailed("hardware signer unplugged".to_string()))
	}
}

/// Secret manager holding a fixed key in memory.
pub struct StaticSecretManager {
	key: String,
	signer: Box<dyn TransactionSigner>,
}

impl StaticSecretManager {
	pub fn new(key: &str, signer: Box<dyn TransactionSigner>) -> Self {
		Self {
			key: key.to_string(),
			signer,
		}
	}
}

#[async_trait]
impl SecretManager for StaticSecretManager {
	async fn acquire(&self) -> Result<KeyAccess<'_>, AccountError> {
		Ok(KeyAccess::new(
			Zeroizing::new(self.key.clone()),
			self.signer.as_ref(),
		))
	}
}
