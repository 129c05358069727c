//! Broadcast result types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a broadcast transaction (`0x`-prefixed hash).
///
/// Handed to the receipt collaborator once issuance completes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub String);

impl TransactionId {
	/// Normalizes a provider-returned hash to lowercase `0x`-prefixed form.
	pub fn new(hash: impl AsRef<str>) -> Self {
		let hash = hash.as_ref().trim();
		let body = hash
			.strip_prefix("0x")
			.or_else(|| hash.strip_prefix("0X"))
			.unwrap_or(hash);
		Self(format!("0x{}", body.to_ascii_lowercase()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for TransactionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Record of one provider try inside a broadcast attempt.
///
/// Only used for retry bookkeeping and logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastOutcome {
	/// 1-based attempt number.
	pub attempt: u32,
	pub provider: String,
	pub result: Result<TransactionId, String>,
}

impl fmt::Display for BroadcastOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.result {
			Ok(txid) => write!(
				f,
				"attempt {} via {} accepted as {}",
				self.attempt, self.provider, txid
			),
			Err(detail) => write!(
				f,
				"attempt {} via {} failed: {}",
				self.attempt, self.provider, detail
			),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_transaction_id_normalization() {
		assert_eq!(TransactionId::new("0xABCDEF").as_str(), "0xabcdef");
		assert_eq!(TransactionId::new("abcdef").as_str(), "0xabcdef");
		assert_eq!(TransactionId::new(" 0Xab ").as_str(), "0xab");
	}

	#[test]
	fn test_outcome_display() {
		let failed = BroadcastOutcome {
			attempt: 2,
			provider: "Arbiscan".to_string(),
			result: Err("rate limited".to_string()),
		};
		assert_eq!(
			failed.to_string(),
			"attempt 2 via Arbiscan failed: rate limited"
		);
	}
}
