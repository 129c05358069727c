//! Shape validation for raw TOML configuration tables.
//!
//! Semantic checks (positive gas limits, known chains, ...) happen after
//! deserialization; this module catches missing keys and wrongly typed
//! values first so the error points at the offending field.

use alloy::primitives::Address;
use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
	#[error("Missing required field: {0}")]
	MissingField(String),
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
}

/// Type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	String,
	Integer { min: Option<i64>, max: Option<i64> },
	Boolean,
	/// String holding a 20-byte hex address.
	Address,
	/// String holding an `http(s)://` URL.
	Url,
	/// Table whose keys are free-form and whose values share one type.
	Map(Box<FieldType>),
	Table(Schema),
}

/// Type alias for field validator functions.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A field definition with name and type.
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Adds a custom validator, run after the type check passes.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, value: &toml::Value) -> Result<(), ValidationError> {
		validate_field_type(&self.name, value, &self.field_type)?;

		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: self.name.clone(),
				message,
			})?;
		}

		Ok(())
	}
}

/// Schema definition with required and optional fields.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML value against this schema.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			field.check(value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.check(value)?;
			}
		}

		Ok(())
	}
}

/// Checks that a string is an `http://` or `https://` URL.
pub fn validate_http_url(url: &str) -> Result<(), String> {
	if url.starts_with("http://") || url.starts_with("https://") {
		Ok(())
	} else {
		Err(format!("'{}' must start with http:// or https://", url))
	}
}

/// Checks that a string parses as a 20-byte hex address.
pub fn validate_address(address: &str) -> Result<(), String> {
	address
		.parse::<Address>()
		.map(|_| ())
		.map_err(|e| format!("'{}' is not a valid address: {}", address, e))
}

fn mismatch(field_name: &str, expected: &str, value: &toml::Value) -> ValidationError {
	ValidationError::TypeMismatch {
		field: field_name.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	}
}

fn validate_field_type(
	field_name: &str,
	value: &toml::Value,
	expected_type: &FieldType,
) -> Result<(), ValidationError> {
	match expected_type {
		FieldType::String => {
			if !value.is_str() {
				return Err(mismatch(field_name, "string", value));
			}
		}
		FieldType::Integer { min, max } => {
			let int_val = value
				.as_integer()
				.ok_or_else(|| mismatch(field_name, "integer", value))?;

			if let Some(min_val) = min {
				if int_val < *min_val {
					return Err(ValidationError::InvalidValue {
						field: field_name.to_string(),
						message: format!("Value {} is less than minimum {}", int_val, min_val),
					});
				}
			}

			if let Some(max_val) = max {
				if int_val > *max_val {
					return Err(ValidationError::InvalidValue {
						field: field_name.to_string(),
						message: format!("Value {} is greater than maximum {}", int_val, max_val),
					});
				}
			}
		}
		FieldType::Boolean => {
			if !value.is_bool() {
				return Err(mismatch(field_name, "boolean", value));
			}
		}
		FieldType::Address => {
			let address = value
				.as_str()
				.ok_or_else(|| mismatch(field_name, "address string", value))?;
			validate_address(address).map_err(|message| ValidationError::InvalidValue {
				field: field_name.to_string(),
				message,
			})?;
		}
		FieldType::Url => {
			let url = value
				.as_str()
				.ok_or_else(|| mismatch(field_name, "url string", value))?;
			validate_http_url(url).map_err(|message| ValidationError::InvalidValue {
				field: field_name.to_string(),
				message,
			})?;
		}
		FieldType::Map(inner_type) => {
			let table = value
				.as_table()
				.ok_or_else(|| mismatch(field_name, "table", value))?;

			for (key, item) in table {
				validate_field_type(&format!("{}.{}", field_name, key), item, inner_type)?;
			}
		}
		FieldType::Table(schema) => {
			schema.validate(value).map_err(|e| match e {
				ValidationError::MissingField(f) => {
					ValidationError::MissingField(format!("{}.{}", field_name, f))
				}
				ValidationError::InvalidValue { field, message } => ValidationError::InvalidValue {
					field: format!("{}.{}", field_name, field),
					message,
				},
				ValidationError::TypeMismatch {
					field,
					expected,
					actual,
				} => ValidationError::TypeMismatch {
					field: format!("{}.{}", field_name, field),
					expected,
					actual,
				},
			})?;
		}
	}

	Ok(())
}

/// A configuration schema that can validate raw TOML values.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn gas_schema() -> Schema {
		Schema::new(
			vec![Field::new(
				"gas_limit",
				FieldType::Integer {
					min: Some(1),
					max: None,
				},
			)],
			vec![
				Field::new("gas_price_dynamic", FieldType::Boolean),
				Field::new("endpoints", FieldType::Map(Box::new(FieldType::Url))),
			],
		)
	}

	#[test]
	fn test_missing_required_field() {
		let value: toml::Value = toml::from_str("gas_price_dynamic = true").unwrap();
		assert_eq!(
			gas_schema().validate(&value),
			Err(ValidationError::MissingField("gas_limit".to_string()))
		);
	}

	#[test]
	fn test_integer_bounds() {
		let value: toml::Value = toml::from_str("gas_limit = 0").unwrap();
		assert!(matches!(
			gas_schema().validate(&value),
			Err(ValidationError::InvalidValue { field, .. }) if field == "gas_limit"
		));
	}

	#[test]
	fn test_map_entries_are_checked() {
		let value: toml::Value = toml::from_str(
			r#"
			gas_limit = 25000
			[endpoints]
			polygon_mainnet = "https://polygon-rpc.com"
			arbitrum_one = "ws://arb1.arbitrum.io"
			"#,
		)
		.unwrap();

		assert!(matches!(
			gas_schema().validate(&value),
			Err(ValidationError::InvalidValue { field, .. }) if field == "endpoints.arbitrum_one"
		));
	}

	#[test]
	fn test_nested_table_prefixes_field_names() {
		let schema = Schema::new(
			vec![Field::new(
				"issuer",
				FieldType::Table(Schema::new(
					vec![Field::new("issuing_address", FieldType::Address)],
					vec![],
				)),
			)],
			vec![],
		);
		let value: toml::Value =
			toml::from_str("[issuer]\nissuing_address = \"not-an-address\"").unwrap();

		assert!(matches!(
			schema.validate(&value),
			Err(ValidationError::InvalidValue { field, .. }) if field == "issuer.issuing_address"
		));
	}

	#[test]
	fn test_custom_validator_runs_after_type_check() {
		let schema = Schema::new(
			vec![Field::new("chain", FieldType::String).with_validator(|value| {
				match value.as_str() {
					Some("polygon_mainnet") => Ok(()),
					_ => Err("unsupported chain".to_string()),
				}
			})],
			vec![],
		);

		let ok: toml::Value = toml::from_str("chain = \"polygon_mainnet\"").unwrap();
		assert!(schema.validate(&ok).is_ok());

		let wrong_type: toml::Value = toml::from_str("chain = 137").unwrap();
		assert!(matches!(
			schema.validate(&wrong_type),
			Err(ValidationError::TypeMismatch { .. })
		));
	}
}
