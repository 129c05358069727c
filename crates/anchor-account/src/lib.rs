//! Signing boundary for issuance transactions.
//!
//! Key material is reached only through a [`SecretManager`], which hands out a
//! short-lived [`KeyAccess`] guard. The guard owns the private key for the
//! duration of one signing call and wipes it when dropped.

use anchor_types::{Address, SignedTransaction, UnsignedTransaction};
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error};
use zeroize::Zeroizing;

pub mod implementations {
	pub mod file;
	pub mod local;
}

pub use implementations::file::FileSecretManager;
pub use implementations::local::LocalTransactionSigner;

#[derive(Debug, Error)]
pub enum AccountError {
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	#[error("Key unavailable: {0}")]
	KeyUnavailable(String),
	#[error("Key belongs to {actual}, but the transaction is sent from {expected}")]
	AddressMismatch { expected: Address, actual: Address },
}

/// Chain-specific transaction signer.
///
/// Signing either yields raw signed bytes or an explicit error; callers must
/// inspect the result before broadcasting anything.
#[async_trait]
pub trait TransactionSigner: Send + Sync {
	/// Signs `tx` for the network identified by `chain_id` (EIP-155).
	async fn sign_transaction(
		&self,
		private_key: &str,
		tx: &UnsignedTransaction,
		chain_id: u64,
	) -> Result<SignedTransaction, AccountError>;
}

/// Source of signing material.
#[async_trait]
pub trait SecretManager: Send + Sync {
	/// Grants access to the private key and its signer for one signing scope.
	async fn acquire(&self) -> Result<KeyAccess<'_>, AccountError>;
}

/// Scoped access to a private key and the signer that consumes it.
pub struct KeyAccess<'a> {
	private_key: Zeroizing<String>,
	signer: &'a dyn TransactionSigner,
}

impl<'a> KeyAccess<'a> {
	pub fn new(private_key: Zeroizing<String>, signer: &'a dyn TransactionSigner) -> Self {
		Self {
			private_key,
			signer,
		}
	}

	pub fn private_key(&self) -> &str {
		self.private_key.as_str()
	}

	pub fn signer(&self) -> &dyn TransactionSigner {
		self.signer
	}
}

impl std::fmt::Debug for KeyAccess<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("KeyAccess")
			.field("private_key", &"<redacted>")
			.finish()
	}
}

/// Signs transactions through a [`SecretManager`], one acquisition per call.
pub struct AccountService {
	secret_manager: Box<dyn SecretManager>,
}

impl AccountService {
	pub fn new(secret_manager: Box<dyn SecretManager>) -> Self {
		Self { secret_manager }
	}

	/// Acquires the key, signs, and releases the key before returning.
	pub async fn sign(
		&self,
		tx: &UnsignedTransaction,
		chain_id: u64,
	) -> Result<SignedTransaction, AccountError> {
		let signed = {
			let access = self.secret_manager.acquire().await?;
			access
				.signer()
				.sign_transaction(access.private_key(), tx, chain_id)
				.await
		};

		match &signed {
			Ok(raw) => debug!("Signed transaction ({} bytes)", raw.len()),
			Err(e) => error!("Error occurred while signing transaction: {}", e),
		}

		signed
	}
}
