//! Configuration loading for the issuer.
//!
//! A TOML file is read, `${VAR}` references are substituted from the
//! environment, the raw table is checked against [`IssuerConfigSchema`],
//! deserialized, overridden from `ANCHOR_*` variables and finally validated
//! semantically.

use anchor_types::{
	Address, ConfigSchema, Field, FieldType, Schema, ValidationError, WEI_PER_GWEI,
};
use regex::Regex;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

mod serde_helpers;
mod types;

pub use types::*;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

impl From<ValidationError> for ConfigError {
	fn from(e: ValidationError) -> Self {
		ConfigError::ValidationError(e.to_string())
	}
}

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "ANCHOR_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<Config, ConfigError> {
		let file_path = self.file_path.as_ref().ok_or_else(|| {
			ConfigError::FileNotFound("No configuration file specified".to_string())
		})?;

		info!("Loading configuration from {}", file_path);
		let content = match tokio::fs::read_to_string(file_path).await {
			Ok(content) => content,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				return Err(ConfigError::FileNotFound(file_path.clone()))
			}
			Err(e) => return Err(e.into()),
		};

		self.load_from_str(&content)
	}

	/// Runs the full pipeline on an in-memory TOML document.
	pub fn load_from_str(&self, content: &str) -> Result<Config, ConfigError> {
		let substituted = substitute_env_vars(content)?;

		let raw: toml::Value =
			toml::from_str(&substituted).map_err(|e| ConfigError::ParseError(e.to_string()))?;
		IssuerConfigSchema.validate(&raw)?;

		let mut config: Config =
			toml::from_str(&substituted).map_err(|e| ConfigError::ParseError(e.to_string()))?;

		self.apply_env_overrides(&mut config)?;
		validate_config(&config)?;

		Ok(config)
	}

	fn env_var(&self, name: &str) -> Option<String> {
		env::var(format!("{}{}", self.env_prefix, name)).ok()
	}

	fn apply_env_overrides(&self, config: &mut Config) -> Result<(), ConfigError> {
		if let Some(address) = self.env_var("ISSUING_ADDRESS") {
			debug!("Overriding issuing address from environment");
			config.issuer.issuing_address = address;
		}

		if let Some(chain) = self.env_var("CHAIN") {
			debug!("Overriding chain from environment");
			config.issuer.chain = chain
				.parse()
				.map_err(|e| ConfigError::ValidationError(format!("{}", e)))?;
		}

		if let Some(key_file) = self.env_var("KEY_FILE") {
			debug!("Overriding key file from environment");
			config.issuer.key_file = key_file.into();
		}

		if let Some(nonce) = self.env_var("NONCE") {
			config.issuer.nonce = nonce
				.parse()
				.map_err(|e| ConfigError::ValidationError(format!("Invalid nonce: {}", e)))?;
		}

		if let Some(gas_price) = self.env_var("GAS_PRICE") {
			config.gas.gas_price = gas_price
				.parse()
				.map_err(|e| ConfigError::ValidationError(format!("Invalid gas price: {}", e)))?;
		}

		for chain in anchor_types::Chain::ALL {
			let family = chain.explorer();
			if let Some(token) = self.env_var(&family.token_key().to_ascii_uppercase()) {
				debug!("Overriding {} token from environment", family);
				*config.explorers.token_mut(family) = Some(token);
			}
		}

		Ok(())
	}
}

/// Replaces `${VAR_NAME}` patterns with the variable's value.
fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
	let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::ParseError(e.to_string()))?;
	let mut result = content.to_string();

	for cap in re.captures_iter(content) {
		let full_match = &cap[0];
		let var_name = &cap[1];

		let env_value =
			env::var(var_name).map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

		result = result.replace(full_match, &env_value);
	}

	Ok(result)
}

/// Semantic checks that the schema cannot express.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
	let chain = config.issuer.chain;
	let gas = &config.gas;

	config.issuing_address()?;

	if gas.gas_limit == 0 {
		return Err(ConfigError::ValidationError(
			"gas_limit must be greater than zero".to_string(),
		));
	}

	if !gas.gas_price_dynamic && gas.gas_price == 0 {
		return Err(ConfigError::ValidationError(
			"gas_price must be greater than zero unless gas_price_dynamic is set".to_string(),
		));
	}

	if !gas.gas_price_dynamic && gas.max_priority_fee_per_gas > gas.gas_price {
		return Err(ConfigError::ValidationError(format!(
			"max_priority_fee_per_gas ({} wei) exceeds gas_price ({} wei)",
			gas.max_priority_fee_per_gas, gas.gas_price
		)));
	}

	if config.broadcast.max_attempts == 0 {
		return Err(ConfigError::ValidationError(
			"broadcast.max_attempts must be at least 1".to_string(),
		));
	}

	if config.explorers.token_for(chain.explorer()).is_none() {
		return Err(ConfigError::ValidationError(format!(
			"{} is required for {}",
			chain.explorer().token_key(),
			chain
		)));
	}

	debug!(
		"Validated configuration for {} (gas price {} Gwei)",
		chain,
		gas.gas_price as f64 / WEI_PER_GWEI as f64
	);

	Ok(())
}

impl Config {
	/// Parsed issuing address.
	pub fn issuing_address(&self) -> Result<Address, ConfigError> {
		self.issuer.issuing_address.parse::<Address>().map_err(|e| {
			ConfigError::ValidationError(format!(
				"Invalid issuing_address '{}': {}",
				self.issuer.issuing_address, e
			))
		})
	}
}

/// Shape of the raw configuration document.
pub struct IssuerConfigSchema;

impl ConfigSchema for IssuerConfigSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let non_negative = || FieldType::Integer {
			min: Some(0),
			max: None,
		};

		let schema = Schema::new(
			// Required fields
			vec![Field::new(
				"issuer",
				FieldType::Table(Schema::new(
					vec![
						Field::new("issuing_address", FieldType::Address),
						Field::new("chain", FieldType::String).with_validator(|value| {
							let name = value.as_str().unwrap_or_default();
							name.parse::<anchor_types::Chain>()
								.map(|_| ())
								.map_err(|e| e.to_string())
						}),
						Field::new("key_file", FieldType::String),
					],
					vec![Field::new("nonce", non_negative())],
				)),
			)],
			// Optional fields
			vec![
				Field::new(
					"gas",
					FieldType::Table(Schema::new(
						vec![],
						vec![
							Field::new("gas_price", non_negative()),
							Field::new("gas_price_dynamic", FieldType::Boolean),
							Field::new(
								"gas_limit",
								FieldType::Integer {
									min: Some(1),
									max: None,
								},
							),
							Field::new("max_priority_fee_per_gas", non_negative()),
							Field::new("fallback_gas_price", non_negative()),
							Field::new("use_fallback_gas_price", FieldType::Boolean),
						],
					)),
				),
				Field::new(
					"broadcast",
					FieldType::Table(Schema::new(
						vec![],
						vec![
							Field::new(
								"max_attempts",
								FieldType::Integer {
									min: Some(1),
									max: Some(100),
								},
							),
							Field::new("retry_interval_secs", non_negative()),
							Field::new(
								"request_timeout_secs",
								FieldType::Integer {
									min: Some(1),
									max: Some(600),
								},
							),
						],
					)),
				),
				Field::new("rpc", FieldType::Map(Box::new(FieldType::Url))),
				Field::new("explorers", FieldType::Map(Box::new(FieldType::String))),
			],
		);

		schema.validate(config)
	}
}
