//! Transaction shapes produced and consumed during a single issuance.
//!
//! An [`UnsignedTransaction`] is built, handed to the signing boundary, and
//! turned into a [`SignedTransaction`] that is broadcast exactly once. Neither
//! outlives the issuance that created it.

use alloy::primitives::{Address, Bytes, U256};
use std::fmt;

/// Fee representation of a transaction.
///
/// The legacy and fee-market (EIP-1559) representations are mutually
/// exclusive, so a transaction carries exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeShape {
	/// Single gas price (type 0 transaction).
	Legacy { gas_price: u128 },
	/// Base/priority fee pair (type 2 transaction).
	FeeMarket {
		max_fee_per_gas: u128,
		max_priority_fee_per_gas: u128,
	},
}

impl FeeShape {
	/// Legacy gas price, if this is a legacy transaction.
	pub fn gas_price(&self) -> Option<u128> {
		match self {
			FeeShape::Legacy { gas_price } => Some(*gas_price),
			FeeShape::FeeMarket { .. } => None,
		}
	}

	pub fn max_fee_per_gas(&self) -> Option<u128> {
		match self {
			FeeShape::Legacy { .. } => None,
			FeeShape::FeeMarket {
				max_fee_per_gas, ..
			} => Some(*max_fee_per_gas),
		}
	}

	pub fn max_priority_fee_per_gas(&self) -> Option<u128> {
		match self {
			FeeShape::Legacy { .. } => None,
			FeeShape::FeeMarket {
				max_priority_fee_per_gas,
				..
			} => Some(*max_priority_fee_per_gas),
		}
	}

	pub fn is_fee_market(&self) -> bool {
		matches!(self, FeeShape::FeeMarket { .. })
	}
}

/// A transaction ready to be signed.
///
/// There is no chain id field: it is attached by the signer using
/// the target chain's network id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
	/// Issuing address the transaction is sent from.
	pub from: Address,
	/// Recipient; anchoring transactions are addressed to the issuer itself.
	pub to: Address,
	pub value: U256,
	/// Payload committed on chain (typically a Merkle root).
	pub data: Bytes,
	pub gas_limit: u64,
	pub nonce: u64,
	pub fee: FeeShape,
}

impl fmt::Display for UnsignedTransaction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{{from: {}, to: {}, value: {}, data: 0x{}, gas: {}, nonce: {}, ",
			self.from,
			self.to,
			self.value,
			hex::encode(&self.data),
			self.gas_limit,
			self.nonce
		)?;
		match self.fee {
			FeeShape::Legacy { gas_price } => write!(f, "gasPrice: {}}}", gas_price),
			FeeShape::FeeMarket {
				max_fee_per_gas,
				max_priority_fee_per_gas,
			} => write!(
				f,
				"maxFeePerGas: {}, maxPriorityFeePerGas: {}}}",
				max_fee_per_gas, max_priority_fee_per_gas
			),
		}
	}
}

/// Raw EIP-2718 encoded signed transaction.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedTransaction(Vec<u8>);

impl SignedTransaction {
	pub fn new(raw: Vec<u8>) -> Self {
		Self(raw)
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	/// `0x`-prefixed hex encoding, as accepted by `eth_sendRawTransaction`.
	pub fn to_hex(&self) -> String {
		format!("0x{}", hex::encode(&self.0))
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl fmt::Debug for SignedTransaction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SignedTransaction({})", self.to_hex())
	}
}
