//! In-process signer backed by an alloy local key.

use crate::{AccountError, TransactionSigner};
use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::TxKind;
use alloy::signers::{local::PrivateKeySigner, SignerSync};
use anchor_types::{FeeShape, SignedTransaction, UnsignedTransaction};
use async_trait::async_trait;

/// Signs legacy (EIP-155) and EIP-1559 transactions with a secp256k1 key.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalTransactionSigner;

impl LocalTransactionSigner {
	pub fn new() -> Self {
		Self
	}

	fn parse_key(private_key: &str) -> Result<PrivateKeySigner, AccountError> {
		let key = private_key.trim();
		let key = key.strip_prefix("0x").unwrap_or(key);

		key.parse::<PrivateKeySigner>()
			.map_err(|e| AccountError::InvalidKey(e.to_string()))
	}

	fn sign_envelope(
		signer: &PrivateKeySigner,
		tx: &UnsignedTransaction,
		chain_id: u64,
	) -> Result<TxEnvelope, AccountError> {
		let envelope = match tx.fee {
			FeeShape::Legacy { gas_price } => {
				let legacy = TxLegacy {
					chain_id: Some(chain_id),
					nonce: tx.nonce,
					gas_price,
					gas_limit: tx.gas_limit,
					to: TxKind::Call(tx.to),
					value: tx.value,
					input: tx.data.clone(),
				};
				let signature = signer
					.sign_hash_sync(&legacy.signature_hash())
					.map_err(|e| AccountError::SigningFailed(e.to_string()))?;
				TxEnvelope::Legacy(legacy.into_signed(signature))
			}
			FeeShape::FeeMarket {
				max_fee_per_gas,
				max_priority_fee_per_gas,
			} => {
				let eip1559 = TxEip1559 {
					chain_id,
					nonce: tx.nonce,
					gas_limit: tx.gas_limit,
					max_fee_per_gas,
					max_priority_fee_per_gas,
					to: TxKind::Call(tx.to),
					value: tx.value,
					access_list: Default::default(),
					input: tx.data.clone(),
				};
				let signature = signer
					.sign_hash_sync(&eip1559.signature_hash())
					.map_err(|e| AccountError::SigningFailed(e.to_string()))?;
				TxEnvelope::Eip1559(eip1559.into_signed(signature))
			}
		};

		Ok(envelope)
	}
}

#[async_trait]
impl TransactionSigner for LocalTransactionSigner {
	async fn sign_transaction(
		&self,
		private_key: &str,
		tx: &UnsignedTransaction,
		chain_id: u64,
	) -> Result<SignedTransaction, AccountError> {
		let signer = Self::parse_key(private_key)?;

		if signer.address() != tx.from {
			return Err(AccountError::AddressMismatch {
				expected: tx.from,
				actual: signer.address(),
			});
		}

		let envelope = Self::sign_envelope(&signer, tx, chain_id)?;
		Ok(SignedTransaction::new(envelope.encoded_2718()))
	}
}
