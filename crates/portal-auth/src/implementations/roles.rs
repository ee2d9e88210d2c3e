//! Role-based policy.
//!
//! Maps role names to the capabilities they grant:
//!
//! ```toml
//! [auth.implementations.roles]
//! admin = ["view-eligibility", "view-team", "view-orders"]
//! rep = []
//! ```
//!
//! Entity-scoped checks: `view` on an order is granted to the order's owner
//! and to anyone holding `view-orders`. Any other entity-scoped capability
//! falls back to the global check.

use crate::{AuthError, PolicyFactory, PolicyInterface, PolicyRegistry};
use async_trait::async_trait;
use portal_types::{
	Capability, ConfigSchema, Field, FieldType, Identity, ImplementationRegistry, Resource,
	Schema, ValidationError,
};
use std::collections::{HashMap, HashSet};

pub struct RolePolicy {
	grants: HashMap<String, HashSet<Capability>>,
}

impl RolePolicy {
	pub fn new(grants: HashMap<String, HashSet<Capability>>) -> Self {
		Self { grants }
	}

	fn holds(&self, identity: &Identity, capability: &Capability) -> bool {
		identity.roles.iter().any(|role| {
			self.grants
				.get(role)
				.is_some_and(|capabilities| capabilities.contains(capability))
		})
	}
}

#[async_trait]
impl PolicyInterface for RolePolicy {
	async fn has_capability(
		&self,
		identity: &Identity,
		capability: &Capability,
	) -> Result<bool, AuthError> {
		Ok(self.holds(identity, capability))
	}

	async fn authorize(
		&self,
		identity: &Identity,
		capability: &Capability,
		resource: Resource<'_>,
	) -> Result<bool, AuthError> {
		match resource {
			Resource::Order(order) if capability.as_str() == Capability::VIEW => {
				let owns = order.owner_id.as_deref() == Some(identity.id.as_str());
				Ok(owns || self.holds(identity, &Capability::from(Capability::VIEW_ORDERS)))
			},
			_ => Ok(self.holds(identity, capability)),
		}
	}
}

/// Every configured role must map to an array of capability names.
pub struct RolePolicySchema {
	roles: Vec<String>,
}

impl ConfigSchema for RolePolicySchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let fields = self
			.roles
			.iter()
			.map(|role| Field::new(role.clone(), FieldType::Array(Box::new(FieldType::String))))
			.collect();
		Schema::new(fields, vec![]).validate(config)
	}
}

pub fn create_policy(config: &toml::Value) -> Result<Box<dyn PolicyInterface>, AuthError> {
	let table = config
		.as_table()
		.ok_or_else(|| AuthError::Configuration("roles policy config must be a table".into()))?;

	RolePolicySchema {
		roles: table.keys().cloned().collect(),
	}
	.validate(config)
	.map_err(|e| AuthError::Configuration(e.to_string()))?;

	let grants = table
		.iter()
		.map(|(role, capabilities)| {
			let capabilities = capabilities
				.as_array()
				.into_iter()
				.flatten()
				.filter_map(|c| c.as_str())
				.map(Capability::from)
				.collect();
			(role.clone(), capabilities)
		})
		.collect::<HashMap<String, HashSet<Capability>>>();

	tracing::debug!(roles = grants.len(), "Loaded role policy");
	Ok(Box::new(RolePolicy::new(grants)))
}

pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "roles";
	type Factory = PolicyFactory;

	fn factory() -> Self::Factory {
		create_policy
	}
}

impl PolicyRegistry for Registry {}
