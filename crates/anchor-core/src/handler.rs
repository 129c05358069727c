//! Issuance orchestration.
//!
//! A [`TransactionHandler`] drives one issuance at a time through
//! balance check, build, sign, verify and broadcast. Each completed step
//! advances the [`IssuanceStage`]; any error moves it to `Failed`.

use crate::builder::TransactionBuilder;
use crate::cost::CostConstants;
use crate::error::IssueError;
use crate::stage::{IssuanceStage, StageTracker};
use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use anchor_account::{AccountService, SecretManager};
use anchor_delivery::FailoverConnector;
use anchor_types::{Address, Chain, SignedTransaction, TransactionId, UnsignedTransaction, U256};
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct TransactionHandler {
	chain: Chain,
	issuing_address: Address,
	cost: CostConstants,
	connector: Arc<FailoverConnector>,
	builder: TransactionBuilder,
	account: AccountService,
	stage: StageTracker,
}

impl TransactionHandler {
	pub fn new(
		issuing_address: Address,
		cost: CostConstants,
		connector: Arc<FailoverConnector>,
		nonce_override: u64,
		secret_manager: Box<dyn SecretManager>,
	) -> Self {
		Self {
			chain: connector.chain(),
			issuing_address,
			cost,
			builder: TransactionBuilder::new(connector.clone(), nonce_override),
			connector,
			account: AccountService::new(secret_manager),
			stage: StageTracker::new(),
		}
	}

	pub fn chain(&self) -> Chain {
		self.chain
	}

	pub fn issuing_address(&self) -> Address {
		self.issuing_address
	}

	pub fn cost(&self) -> &CostConstants {
		&self.cost
	}

	pub async fn stage(&self) -> IssuanceStage {
		self.stage.get().await
	}

	/// Issues one transaction anchoring `payload` and returns its hash.
	pub async fn issue_transaction(&self, payload: &[u8]) -> Result<TransactionId, IssueError> {
		self.reset_stage().await?;

		match self.run_issuance(payload).await {
			Ok(txid) => {
				self.stage.set(IssuanceStage::Done).await?;
				info!("Issued transaction {} on {}", txid, self.chain);
				Ok(txid)
			}
			Err(e) => {
				error!("Issuance failed: {}", e);
				let _ = self.stage.set(IssuanceStage::Failed).await;
				Err(e)
			}
		}
	}

	/// Returns the stage to `Idle`. A stage left mid-way belongs to an
	/// issuance whose future was dropped and is closed out as `Failed` first.
	async fn reset_stage(&self) -> Result<(), IssueError> {
		match self.stage.get().await {
			IssuanceStage::Idle => return Ok(()),
			IssuanceStage::Done | IssuanceStage::Failed => {}
			abandoned => {
				warn!("Previous issuance was abandoned at stage {}", abandoned);
				self.stage.set(IssuanceStage::Failed).await?;
			}
		}
		self.stage.set(IssuanceStage::Idle).await
	}

	async fn run_issuance(&self, payload: &[u8]) -> Result<TransactionId, IssueError> {
		self.ensure_balance().await?;
		self.stage.set(IssuanceStage::BalanceChecked).await?;

		let tx = self.create_transaction(payload).await;
		self.stage.set(IssuanceStage::Built).await?;

		let signed = self.sign_transaction(&tx).await?;
		self.stage.set(IssuanceStage::Signed).await?;

		self.verify_transaction(&signed, payload);
		self.stage.set(IssuanceStage::Verified).await?;

		let txid = self.broadcast_transaction(signed).await?;
		self.stage.set(IssuanceStage::Broadcast).await?;

		Ok(txid)
	}

	/// Fails unless the issuing address can pay the recommended maximum cost.
	/// Returns the observed balance.
	pub async fn ensure_balance(&self) -> Result<U256, IssueError> {
		let available = self.connector.get_balance(self.issuing_address).await;
		let required = self.cost.recommended_max_cost();

		if available < required {
			return Err(IssueError::InsufficientFunds {
				address: self.issuing_address,
				required,
				available,
			});
		}

		info!(
			"Balance of {} is {} wei, {} wei required",
			self.issuing_address, available, required
		);
		Ok(available)
	}

	pub async fn create_transaction(&self, payload: &[u8]) -> UnsignedTransaction {
		self.builder
			.create_transaction(&self.cost, self.issuing_address, payload)
			.await
	}

	/// Signs `tx` for this handler's chain. The key is held only for the
	/// duration of the call.
	pub async fn sign_transaction(
		&self,
		tx: &UnsignedTransaction,
	) -> Result<SignedTransaction, IssueError> {
		Ok(self.account.sign(tx, self.chain.chain_id()).await?)
	}

	/// Checks that `signed` carries `payload` and is addressed to the issuer.
	/// A mismatch is logged but does not stop issuance.
	pub fn verify_transaction(&self, signed: &SignedTransaction, payload: &[u8]) -> bool {
		let envelope = match TxEnvelope::decode_2718(&mut signed.as_bytes()) {
			Ok(envelope) => envelope,
			Err(e) => {
				warn!("Could not decode signed transaction: {}", e);
				return false;
			}
		};

		let data_matches = envelope.input().as_ref() == payload;
		let recipient_matches = envelope.to() == Some(self.issuing_address);

		if !data_matches {
			warn!("Signed transaction data does not match the payload");
		}
		if !recipient_matches {
			warn!(
				"Signed transaction recipient {:?} is not the issuing address {}",
				envelope.to(),
				self.issuing_address
			);
		}

		data_matches && recipient_matches
	}

	pub async fn broadcast_transaction(
		&self,
		signed: SignedTransaction,
	) -> Result<TransactionId, IssueError> {
		info!("Broadcasting {} byte transaction on {}", signed.len(), self.chain);
		Ok(self.connector.broadcast_tx(&signed).await?)
	}
}
