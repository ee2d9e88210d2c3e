//! Validation of per-implementation configuration tables.
//!
//! Each pluggable implementation (storage backend, identity provider, policy,
//! image engine) receives its raw TOML table and checks it against a
//! [`Schema`] before building itself.

use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Debug, Error)]
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

/// Expected type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	String,
	/// Integer with optional inclusive bounds.
	Integer { min: Option<i64>, max: Option<i64> },
	Boolean,
	/// Array whose elements all share one type.
	Array(Box<FieldType>),
	/// Any table; contents are checked by the implementation itself.
	Table,
}

impl FieldType {
	fn name(&self) -> &'static str {
		match self {
			FieldType::String => "string",
			FieldType::Integer { .. } => "integer",
			FieldType::Boolean => "boolean",
			FieldType::Array(_) => "array",
			FieldType::Table => "table",
		}
	}
}

/// Custom check run after the type check succeeds.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

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

	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, value: &toml::Value) -> Result<(), ValidationError> {
		check_type(&self.name, value, &self.field_type)?;
		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: self.name.clone(),
				message,
			})?;
		}
		Ok(())
	}
}

/// Required and optional fields of one implementation table.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML table against this schema.
	///
	/// Required fields must be present; optional fields are only checked
	/// when present. Keys the schema does not mention are ignored.
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

fn check_type(field: &str, value: &toml::Value, expected: &FieldType) -> Result<(), ValidationError> {
	let mismatch = || ValidationError::TypeMismatch {
		field: field.to_string(),
		expected: expected.name().to_string(),
		actual: value.type_str().to_string(),
	};

	match expected {
		FieldType::String if value.is_str() => Ok(()),
		FieldType::Boolean if value.is_bool() => Ok(()),
		FieldType::Table if value.is_table() => Ok(()),
		FieldType::Integer { min, max } => {
			let n = value.as_integer().ok_or_else(mismatch)?;
			if let Some(min) = min.filter(|min| n < *min) {
				return Err(ValidationError::InvalidValue {
					field: field.to_string(),
					message: format!("Value {} is less than minimum {}", n, min),
				});
			}
			if let Some(max) = max.filter(|max| n > *max) {
				return Err(ValidationError::InvalidValue {
					field: field.to_string(),
					message: format!("Value {} is greater than maximum {}", n, max),
				});
			}
			Ok(())
		},
		FieldType::Array(inner) => {
			let items = value.as_array().ok_or_else(mismatch)?;
			for (i, item) in items.iter().enumerate() {
				check_type(&format!("{}[{}]", field, i), item, inner)?;
			}
			Ok(())
		},
		_ => Err(mismatch()),
	}
}

/// Implemented by every pluggable component to validate its config table.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}
