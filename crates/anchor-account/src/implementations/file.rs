//! Key file backed secret manager.

use crate::{AccountError, KeyAccess, LocalTransactionSigner, SecretManager, TransactionSigner};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;
use zeroize::Zeroizing;

/// Reads the private key from the first line of a file on every acquisition.
///
/// Nothing is cached: the key lives only inside the [`KeyAccess`] guard.
pub struct FileSecretManager {
	path: PathBuf,
	signer: Box<dyn TransactionSigner>,
}

impl FileSecretManager {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self::with_signer(path, Box::new(LocalTransactionSigner::new()))
	}

	pub fn with_signer(path: impl Into<PathBuf>, signer: Box<dyn TransactionSigner>) -> Self {
		Self {
			path: path.into(),
			signer,
		}
	}
}

#[async_trait]
impl SecretManager for FileSecretManager {
	async fn acquire(&self) -> Result<KeyAccess<'_>, AccountError> {
		let contents = Zeroizing::new(tokio::fs::read_to_string(&self.path).await.map_err(
			|e| AccountError::KeyUnavailable(format!("{}: {}", self.path.display(), e)),
		)?);

		let key = contents.lines().next().map(str::trim).unwrap_or_default();
		if key.is_empty() {
			return Err(AccountError::KeyUnavailable(format!(
				"{} does not contain a key",
				self.path.display()
			)));
		}

		debug!("Acquired signing key from {}", self.path.display());
		Ok(KeyAccess::new(
			Zeroizing::new(key.to_string()),
			self.signer.as_ref(),
		))
	}
}
