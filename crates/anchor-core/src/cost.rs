//! Fee parameters for issuance transactions.

use crate::error::CoreError;
use anchor_config::GasConfig;
use anchor_delivery::FailoverConnector;
use anchor_types::{U256, WEI_PER_GWEI};
use tracing::info;

/// Validated fee parameters shared by every transaction of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostConstants {
	gas_price: u128,
	gas_limit: u64,
	max_priority_fee_per_gas: Option<u128>,
}

impl CostConstants {
	/// A `max_priority_fee_per_gas` of zero selects legacy transactions.
	pub fn new(
		max_priority_fee_per_gas: u128,
		gas_price: u128,
		gas_limit: u64,
	) -> Result<Self, CoreError> {
		if gas_price == 0 {
			return Err(CoreError::InvalidCost("gas price must be positive".to_string()));
		}
		if gas_limit == 0 {
			return Err(CoreError::InvalidCost("gas limit must be positive".to_string()));
		}
		if max_priority_fee_per_gas > gas_price {
			return Err(CoreError::InvalidCost(format!(
				"priority fee {} exceeds gas price {}",
				max_priority_fee_per_gas, gas_price
			)));
		}

		let cost = Self {
			gas_price,
			gas_limit,
			max_priority_fee_per_gas: (max_priority_fee_per_gas > 0)
				.then_some(max_priority_fee_per_gas),
		};

		info!(
			"Cost constants: gas_price={} Gwei, gas_limit={}, max_priority_fee_per_gas={} Gwei",
			format_gwei(cost.gas_price),
			cost.gas_limit,
			format_gwei(max_priority_fee_per_gas)
		);

		Ok(cost)
	}

	/// Builds cost constants from configuration, asking the providers for the
	/// gas price when `gas_price_dynamic` is set.
	pub async fn resolve(gas: &GasConfig, connector: &FailoverConnector) -> Result<Self, CoreError> {
		let gas_price = if gas.gas_price_dynamic {
			let price = connector.gas_price().await;
			if price == 0 {
				return Err(CoreError::InvalidCost(format!(
					"no provider reported a gas price for {}",
					connector.chain()
				)));
			}
			info!("Using provider gas price of {} Gwei", format_gwei(price));
			price
		} else {
			gas.gas_price as u128
		};

		Self::new(
			gas.max_priority_fee_per_gas as u128,
			gas_price,
			gas.gas_limit,
		)
	}

	/// Upper bound of what one transaction may cost: `gas_price * gas_limit`.
	pub fn recommended_max_cost(&self) -> U256 {
		U256::from(self.gas_price) * U256::from(self.gas_limit)
	}

	pub fn gas_price(&self) -> u128 {
		self.gas_price
	}

	pub fn gas_limit(&self) -> u64 {
		self.gas_limit
	}

	pub fn max_priority_fee_per_gas(&self) -> Option<u128> {
		self.max_priority_fee_per_gas
	}
}

fn format_gwei(wei: u128) -> String {
	let whole = wei / WEI_PER_GWEI;
	let fraction = wei % WEI_PER_GWEI;
	if fraction == 0 {
		whole.to_string()
	} else {
		let digits = format!("{:09}", fraction);
		format!("{}.{}", whole, digits.trim_end_matches('0'))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_utils::{connector_with, StubProvider};
	use anchor_delivery::{BroadcastPolicy, ProviderRegistry};
	use std::sync::Arc;

	#[test]
	fn test_recommended_max_cost() {
		let cost = CostConstants::new(0, 30_000_000_000, 25_000).unwrap();
		assert_eq!(
			cost.recommended_max_cost(),
			U256::from(750_000_000_000_000u64)
		);
		assert_eq!(cost.max_priority_fee_per_gas(), None);
	}

	#[test]
	fn test_max_cost_does_not_overflow() {
		let cost = CostConstants::new(0, u128::MAX, u64::MAX).unwrap();
		assert_eq!(
			cost.recommended_max_cost(),
			U256::from(u128::MAX) * U256::from(u64::MAX)
		);
	}

	#[test]
	fn test_positive_priority_fee_is_kept() {
		let cost = CostConstants::new(1_500_000_000, 30_000_000_000, 25_000).unwrap();
		assert_eq!(cost.max_priority_fee_per_gas(), Some(1_500_000_000));
	}

	#[test]
	fn test_rejects_zero_values() {
		assert!(matches!(
			CostConstants::new(0, 0, 25_000),
			Err(CoreError::InvalidCost(_))
		));
		assert!(matches!(
			CostConstants::new(0, 1, 0),
			Err(CoreError::InvalidCost(_))
		));
	}

	#[test]
	fn test_rejects_priority_fee_above_gas_price() {
		assert!(CostConstants::new(2, 1, 25_000).is_err());
	}

	#[test]
	fn test_format_gwei() {
		assert_eq!(format_gwei(30_000_000_000), "30");
		assert_eq!(format_gwei(1_500_000_000), "1.5");
		assert_eq!(format_gwei(1), "0.000000001");
	}

	#[tokio::test]
	async fn test_resolve_uses_static_gas_price() {
		let connector = FailoverConnector::new(
			anchor_types::Chain::PolygonMumbai,
			Arc::new(ProviderRegistry::builder().build()),
			BroadcastPolicy::default(),
		);
		let gas = GasConfig {
			gas_price: 30_000_000_000,
			..Default::default()
		};

		let cost = CostConstants::resolve(&gas, &connector).await.unwrap();
		assert_eq!(cost.gas_price(), 30_000_000_000);
		assert_eq!(cost.gas_limit(), 25_000);
	}

	#[tokio::test]
	async fn test_resolve_uses_provider_gas_price() {
		let connector = connector_with(StubProvider::new().with_gas_price(42_000_000_000));
		let gas = GasConfig {
			gas_price: 1,
			gas_price_dynamic: true,
			gas_limit: 25_000,
			..Default::default()
		};

		let cost = CostConstants::resolve(&gas, &connector).await.unwrap();
		assert_eq!(cost.gas_price(), 42_000_000_000);
		assert_eq!(
			cost.recommended_max_cost(),
			U256::from(1_050_000_000_000_000u64)
		);
	}

	#[tokio::test]
	async fn test_resolve_rejects_unknown_dynamic_gas_price() {
		let connector = FailoverConnector::new(
			anchor_types::Chain::PolygonMumbai,
			Arc::new(ProviderRegistry::builder().build()),
			BroadcastPolicy::default(),
		);
		let gas = GasConfig {
			gas_price_dynamic: true,
			..Default::default()
		};

		let result = CostConstants::resolve(&gas, &connector).await;
		assert!(matches!(result, Err(CoreError::InvalidCost(_))));
	}
}
