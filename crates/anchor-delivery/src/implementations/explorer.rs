//! Explorer REST provider.
//!
//! Polygonscan, Arbiscan and Optimistic Etherscan expose the same Etherscan
//! style API, so a single provider parametrized by [`ExplorerFamily`] and base
//! URL covers all of them. Responses use the envelope
//! `{"status": "1" | "0", "message": ..., "result": ...}`; calls routed through
//! the `proxy` module may instead answer with a bare JSON-RPC object.

use crate::{ProviderError, ProviderInterface};
use anchor_config::DEFAULT_FALLBACK_GAS_PRICE;
use anchor_types::{
	Address, Chain, ExplorerFamily, SignedTransaction, TransactionId, U256, WEI_PER_GWEI,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct ExplorerResponse {
	#[serde(default)]
	status: Option<String>,
	#[serde(default)]
	message: Option<String>,
	#[serde(default)]
	result: Option<Value>,
	#[serde(default)]
	error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
	message: String,
}

impl ExplorerResponse {
	fn into_result(self) -> Result<Value, ProviderError> {
		if let Some(error) = self.error {
			return Err(ProviderError::Rejected(error.message));
		}

		match self.status.as_deref() {
			Some("1") | None => self.result.ok_or_else(|| {
				ProviderError::InvalidResponse("response carries no result".to_string())
			}),
			Some(_) => {
				let detail = match self.result {
					Some(Value::String(detail)) if !detail.is_empty() => detail,
					_ => self.message.unwrap_or_else(|| "unknown error".to_string()),
				};
				Err(ProviderError::Rejected(detail))
			}
		}
	}
}

/// Etherscan-family explorer used as a read and broadcast fallback.
pub struct ExplorerProvider {
	family: ExplorerFamily,
	base_url: String,
	api_token: String,
	gas_price_fallback: Option<u128>,
	timeout: Duration,
	client: reqwest::Client,
}

impl ExplorerProvider {
	/// Creates a provider for `chain` against its public explorer API.
	pub fn new(
		chain: Chain,
		api_token: impl Into<String>,
		timeout: Duration,
	) -> Result<Self, ProviderError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| ProviderError::Configuration(e.to_string()))?;

		Ok(Self {
			family: chain.explorer(),
			base_url: chain.explorer_base_url().to_string(),
			api_token: api_token.into(),
			gas_price_fallback: Some(DEFAULT_FALLBACK_GAS_PRICE as u128),
			timeout,
			client,
		})
	}

	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into();
		self
	}

	/// Gas price reported when the gas oracle fails. `None` turns the failure
	/// into an error.
	pub fn with_gas_price_fallback(mut self, fallback: Option<u128>) -> Self {
		self.gas_price_fallback = fallback;
		self
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	async fn get(&self, params: &[(&str, &str)]) -> Result<Value, ProviderError> {
		let response = self
			.client
			.get(&self.base_url)
			.query(params)
			.query(&[("apikey", self.api_token.as_str())])
			.send()
			.await
			.map_err(|e| self.transport_error(e))?;

		self.decode(response).await
	}

	async fn post(&self, params: &[(&str, &str)]) -> Result<Value, ProviderError> {
		let mut form: Vec<(&str, &str)> = params.to_vec();
		form.push(("apikey", self.api_token.as_str()));

		let response = self
			.client
			.post(&self.base_url)
			.form(&form)
			.send()
			.await
			.map_err(|e| self.transport_error(e))?;

		self.decode(response).await
	}

	async fn decode(&self, response: reqwest::Response) -> Result<Value, ProviderError> {
		let status = response.status();
		if !status.is_success() {
			return Err(ProviderError::Network(format!(
				"{} answered with HTTP {}",
				self.family.name(),
				status
			)));
		}

		let envelope: ExplorerResponse = response
			.json()
			.await
			.map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

		envelope.into_result()
	}

	fn transport_error(&self, error: reqwest::Error) -> ProviderError {
		if error.is_timeout() {
			ProviderError::Timeout(self.timeout)
		} else {
			ProviderError::Network(error.to_string())
		}
	}

	async fn query_gas_oracle(&self) -> Result<u128, ProviderError> {
		let result = self
			.get(&[("module", "gastracker"), ("action", "gasoracle")])
			.await?;

		let safe = result
			.get("SafeGasPrice")
			.and_then(Value::as_str)
			.ok_or_else(|| ProviderError::InvalidResponse("missing SafeGasPrice".to_string()))?;

		parse_gwei(safe).ok_or_else(|| {
			ProviderError::InvalidResponse(format!("unparseable SafeGasPrice: {}", safe))
		})
	}
}

fn result_str(value: &Value) -> Result<&str, ProviderError> {
	value
		.as_str()
		.ok_or_else(|| ProviderError::InvalidResponse(format!("expected a string, got {}", value)))
}

/// Converts a decimal Gwei amount such as `"30"` or `"1.5"` into wei.
fn parse_gwei(value: &str) -> Option<u128> {
	let value = value.trim();
	let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
	if whole.is_empty() && fraction.is_empty() {
		return None;
	}

	let whole: u128 = if whole.is_empty() {
		0
	} else {
		whole.parse().ok()?
	};

	let digits: String = fraction.chars().take(9).collect();
	let fraction: u128 = if digits.is_empty() {
		0
	} else {
		let scale = 10u128.pow(9 - digits.len() as u32);
		digits.parse::<u128>().ok()? * scale
	};

	whole.checked_mul(WEI_PER_GWEI)?.checked_add(fraction)
}

#[async_trait]
impl ProviderInterface for ExplorerProvider {
	fn name(&self) -> &str {
		self.family.name()
	}

	async fn get_balance(&self, address: Address) -> Result<U256, ProviderError> {
		let address = address.to_string();
		let result = self
			.get(&[
				("module", "account"),
				("action", "balance"),
				("address", address.as_str()),
				("tag", "latest"),
			])
			.await?;

		let balance = result_str(&result)?;
		U256::from_str_radix(balance, 10)
			.map_err(|e| ProviderError::InvalidResponse(format!("balance {}: {}", balance, e)))
	}

	async fn get_gas_price(&self) -> Result<u128, ProviderError> {
		match self.query_gas_oracle().await {
			Ok(price) => Ok(price),
			Err(e @ (ProviderError::Rejected(_) | ProviderError::InvalidResponse(_))) => {
				match self.gas_price_fallback {
					Some(fallback) => {
						warn!(
							provider = self.name(),
							fallback = %fallback,
							"Gas oracle unavailable ({}), using fallback gas price", e
						);
						Ok(fallback)
					}
					None => Err(e),
				}
			}
			Err(e) => Err(e),
		}
	}

	async fn get_address_nonce(&self, address: Address) -> Result<u64, ProviderError> {
		let address = address.to_string();
		let result = self
			.get(&[
				("module", "proxy"),
				("action", "eth_getTransactionCount"),
				("address", address.as_str()),
				("tag", "latest"),
			])
			.await?;

		let count = result_str(&result)?;
		u64::from_str_radix(count.trim_start_matches("0x"), 16)
			.map_err(|e| ProviderError::InvalidResponse(format!("nonce {}: {}", count, e)))
	}

	async fn broadcast_tx(&self, tx: &SignedTransaction) -> Result<TransactionId, ProviderError> {
		let raw = tx.to_hex();
		let result = self
			.post(&[
				("module", "proxy"),
				("action", "eth_sendRawTransaction"),
				("hex", raw.as_str()),
			])
			.await?;

		let hash = result_str(&result)?;
		debug!("{} accepted transaction {}", self.name(), hash);
		Ok(TransactionId::new(hash))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;
	use wiremock::matchers::{body_string_contains, method, path, query_param};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	async fn provider(server: &MockServer) -> ExplorerProvider {
		ExplorerProvider::new(Chain::PolygonMumbai, "token", Duration::from_secs(5))
			.unwrap()
			.with_base_url(format!("{}/api", server.uri()))
	}

	fn issuer() -> Address {
		Address::repeat_byte(0x42)
	}

	#[tokio::test]
	async fn test_get_balance_parses_decimal_result() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/api"))
			.and(query_param("module", "account"))
			.and(query_param("action", "balance"))
			.and(query_param("tag", "latest"))
			.and(query_param("apikey", "token"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"status": "1",
				"message": "OK",
				"result": "800000000000000"
			})))
			.mount(&server)
			.await;

		let balance = provider(&server).await.get_balance(issuer()).await.unwrap();
		assert_eq!(balance, U256::from(800_000_000_000_000u64));
	}

	#[tokio::test]
	async fn test_get_address_nonce_parses_hex_result() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(query_param("module", "proxy"))
			.and(query_param("action", "eth_getTransactionCount"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"jsonrpc": "2.0",
				"id": 1,
				"result": "0x1a"
			})))
			.mount(&server)
			.await;

		let nonce = provider(&server)
			.await
			.get_address_nonce(issuer())
			.await
			.unwrap();
		assert_eq!(nonce, 26);
	}

	#[tokio::test]
	async fn test_gas_oracle_converts_gwei_to_wei() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(query_param("module", "gastracker"))
			.and(query_param("action", "gasoracle"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"status": "1",
				"message": "OK",
				"result": {
					"LastBlock": "39871234",
					"SafeGasPrice": "30.5",
					"ProposeGasPrice": "31",
					"FastGasPrice": "35"
				}
			})))
			.mount(&server)
			.await;

		let price = provider(&server).await.get_gas_price().await.unwrap();
		assert_eq!(price, 30_500_000_000);
	}

	#[tokio::test]
	async fn test_rate_limited_gas_oracle_falls_back() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(query_param("module", "gastracker"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"status": "0",
				"message": "NOTOK",
				"result": "rate limited"
			})))
			.mount(&server)
			.await;

		let price = provider(&server).await.get_gas_price().await.unwrap();
		assert_eq!(price, 20_000_000_000);
	}

	#[tokio::test]
	async fn test_disabled_fallback_surfaces_oracle_error() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(query_param("module", "gastracker"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"status": "0",
				"message": "NOTOK",
				"result": "rate limited"
			})))
			.mount(&server)
			.await;

		let result = provider(&server)
			.await
			.with_gas_price_fallback(None)
			.get_gas_price()
			.await;
		match result {
			Err(ProviderError::Rejected(detail)) => assert_eq!(detail, "rate limited"),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[tokio::test]
	async fn test_broadcast_posts_raw_hex() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/api"))
			.and(body_string_contains("action=eth_sendRawTransaction"))
			.and(body_string_contains("hex=0xf86b01"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"jsonrpc": "2.0",
				"id": 1,
				"result": "0xABCDEF"
			})))
			.expect(1)
			.mount(&server)
			.await;

		let tx = SignedTransaction::new(vec![0xf8, 0x6b, 0x01]);
		let id = provider(&server).await.broadcast_tx(&tx).await.unwrap();
		assert_eq!(id.as_str(), "0xabcdef");
	}

	#[tokio::test]
	async fn test_broadcast_surfaces_json_rpc_error() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"jsonrpc": "2.0",
				"id": 1,
				"error": { "code": -32000, "message": "nonce too low" }
			})))
			.mount(&server)
			.await;

		let tx = SignedTransaction::new(vec![0x01]);
		let result = provider(&server).await.broadcast_tx(&tx).await;
		match result {
			Err(ProviderError::Rejected(detail)) => assert_eq!(detail, "nonce too low"),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[tokio::test]
	async fn test_http_failure_is_a_network_error() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(502))
			.mount(&server)
			.await;

		let result = provider(&server).await.get_balance(issuer()).await;
		assert!(matches!(result, Err(ProviderError::Network(_))));
	}

	#[test]
	fn test_parse_gwei() {
		assert_eq!(parse_gwei("30"), Some(30_000_000_000));
		assert_eq!(parse_gwei("0.000000001"), Some(1));
		assert_eq!(parse_gwei("1.5"), Some(1_500_000_000));
		assert_eq!(parse_gwei(".25"), Some(250_000_000));
		assert_eq!(parse_gwei(""), None);
		assert_eq!(parse_gwei("abc"), None);
	}

	#[test]
	fn test_uses_family_name() {
		let provider =
			ExplorerProvider::new(Chain::ArbitrumOne, "t", Duration::from_secs(1)).unwrap();
		assert_eq!(provider.name(), ExplorerFamily::Arbiscan.name());
		assert_eq!(provider.base_url(), "https://api.arbiscan.io/api");
	}
}
