//! Identity provider backed by a fixed list of users.
//!
//! ```toml
//! [auth.implementations.static]
//! users = [{ id = "1", token = "${ADMIN_TOKEN}", roles = ["admin"] }]
//! ```

use crate::{AuthError, IdentityFactory, IdentityProvider, IdentityRegistry};
use async_trait::async_trait;
use portal_types::{
	ConfigSchema, Field, FieldType, Identity, ImplementationRegistry, Schema, SecretString,
	ValidationError,
};
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Deserialize)]
struct StaticUser {
	id: String,
	token: SecretString,
	#[serde(default)]
	roles: Vec<String>,
}

pub struct StaticIdentityProvider {
	users: Vec<StaticUser>,
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
	async fn authenticate(&self, token: &str) -> Result<Option<Identity>, AuthError> {
		Ok(self
			.users
			.iter()
			.find(|user| user.token.matches(token))
			.map(|user| Identity::new(user.id.clone(), user.roles.clone())))
	}
}

pub struct StaticIdentitySchema;

impl ConfigSchema for StaticIdentitySchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(
			vec![Field::new("users", FieldType::Array(Box::new(FieldType::Table)))],
			vec![],
		)
		.validate(config)
	}
}

/// Builds the provider, rejecting empty or duplicated tokens.
pub fn create_identity_provider(
	config: &toml::Value,
) -> Result<Box<dyn IdentityProvider>, AuthError> {
	StaticIdentitySchema
		.validate(config)
		.map_err(|e| AuthError::Configuration(e.to_string()))?;

	let users = config
		.get("users")
		.cloned()
		.unwrap_or_else(|| toml::Value::Array(Vec::new()));
	let users: Vec<StaticUser> = users
		.try_into()
		.map_err(|e: toml::de::Error| AuthError::Configuration(e.to_string()))?;

	let mut seen = HashSet::new();
	for user in &users {
		if user.token.is_empty() {
			return Err(AuthError::Configuration(format!(
				"User '{}' has an empty token",
				user.id
			)));
		}
		if !seen.insert(user.token.expose_secret()) {
			return Err(AuthError::Configuration(format!(
				"User '{}' shares a token with another user",
				user.id
			)));
		}
	}

	tracing::debug!(count = users.len(), "Loaded static identities");
	Ok(Box::new(StaticIdentityProvider { users }))
}

pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "static";
	type Factory = IdentityFactory;

	fn factory() -> Self::Factory {
		create_identity_provider
	}
}

impl IdentityRegistry for Registry {}
