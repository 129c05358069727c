use anchor_account::AccountError;
use anchor_config::ConfigError;
use anchor_delivery::{DeliveryError, ProviderError};
use anchor_types::{Address, U256};
use thiserror::Error;

use crate::stage::IssuanceStage;

/// Errors raised while wiring the issuer together.
#[derive(Error, Debug)]
pub enum CoreError {
	#[error("Invalid cost parameters: {0}")]
	InvalidCost(String),

	#[error("Configuration error: {0}")]
	Config(#[from] ConfigError),

	#[error("Provider setup error: {0}")]
	Provider(#[from] ProviderError),
}

/// Errors raised while issuing a transaction.
#[derive(Error, Debug)]
pub enum IssueError {
	#[error("{}", insufficient_funds(.address, .required, .available))]
	InsufficientFunds {
		address: Address,
		required: U256,
		available: U256,
	},

	#[error("Signing failed: {0}")]
	Signing(#[from] AccountError),

	#[error("Broadcast failed: {0}")]
	Broadcast(#[from] DeliveryError),

	#[error("Invalid stage transition from {from} to {to}")]
	InvalidStage {
		from: IssuanceStage,
		to: IssuanceStage,
	},
}

fn insufficient_funds(address: &Address, required: &U256, available: &U256) -> String {
	format!(
		"Please add {} wei to the address {}",
		required.saturating_sub(*available),
		address
	)
}
