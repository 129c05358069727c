use crate::cost::CostConstants;
use crate::error::CoreError;
use crate::handler::TransactionHandler;
use anchor_account::FileSecretManager;
use anchor_config::Config;
use anchor_delivery::{BroadcastPolicy, FailoverConnector, ProviderRegistry};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Wires providers, cost constants and key access into a handler for the
/// configured chain.
///
/// Pending broadcast retries stop once `cancel` turns `true`.
pub async fn instantiate_handler(
	config: &Config,
	cancel: Option<watch::Receiver<bool>>,
) -> Result<TransactionHandler, CoreError> {
	let chain = config.issuer.chain;
	let issuing_address = config.issuing_address()?;
	info!("Instantiating issuer for {} on {}", issuing_address, chain);

	let registry = Arc::new(ProviderRegistry::from_config(config)?);
	let mut connector =
		FailoverConnector::new(chain, registry, BroadcastPolicy::from(&config.broadcast));
	if let Some(cancel) = cancel {
		connector = connector.with_cancellation(cancel);
	}

	let cost = CostConstants::resolve(&config.gas, &connector).await?;
	let secret_manager = FileSecretManager::new(config.issuer.key_file.clone());

	Ok(TransactionHandler::new(
		issuing_address,
		cost,
		Arc::new(connector),
		config.issuer.nonce,
		Box::new(secret_manager),
	))
}
