//! Registry of every implementation factory the portal ships with.
//!
//! Implementations are selected by name in the configuration; this module
//! resolves those names to factory functions and hands them to the builder.

use portal_auth::{IdentityFactory, PolicyFactory};
use portal_config::Config;
use portal_core::{PortalBuilder, PortalEngine, PortalFactories};
use portal_images::ImageEngineFactory;
use portal_storage::StorageFactory;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Global registry for all implementation factories.
pub struct FactoryRegistry {
	pub storage: HashMap<String, StorageFactory>,
	pub identity: HashMap<String, IdentityFactory>,
	pub policy: HashMap<String, PolicyFactory>,
	pub images: HashMap<String, ImageEngineFactory>,
}

impl FactoryRegistry {
	pub fn new() -> Self {
		Self {
			storage: HashMap::new(),
			identity: HashMap::new(),
			policy: HashMap::new(),
			images: HashMap::new(),
		}
	}
}

impl Default for FactoryRegistry {
	fn default() -> Self {
		Self::new()
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Returns the global registry, populating it on first use.
pub fn get_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in portal_storage::get_all_implementations() {
			tracing::debug!("Registering storage implementation: {}", name);
			registry.storage.insert(name.to_string(), factory);
		}

		for (name, factory) in portal_auth::get_all_identity_implementations() {
			tracing::debug!("Registering identity implementation: {}", name);
			registry.identity.insert(name.to_string(), factory);
		}

		for (name, factory) in portal_auth::get_all_policy_implementations() {
			tracing::debug!("Registering policy implementation: {}", name);
			registry.policy.insert(name.to_string(), factory);
		}

		for (name, factory) in portal_images::get_all_implementations() {
			tracing::debug!("Registering image engine: {}", name);
			registry.images.insert(name.to_string(), factory);
		}

		registry
	})
}

/// Picks the factories for `names` out of a registry field, failing on the
/// first unknown name.
macro_rules! build_factories {
	($registry:expr, $names:expr, $registry_field:ident, $type_name:literal) => {{
		let mut factories = HashMap::new();
		for name in $names {
			if let Some(factory) = $registry.$registry_field.get(name.as_str()) {
				factories.insert(name.clone(), *factory);
			} else {
				let mut available: Vec<_> = $registry.$registry_field.keys().cloned().collect();
				available.sort();
				return Err(format!(
					"Unknown {} implementation '{}'. Available: [{}]",
					$type_name,
					name,
					available.join(", ")
				)
				.into());
			}
		}
		factories
	}};
}

/// Builds the portal engine from configuration using the global registry.
pub fn build_portal_from_config(
	config: Config,
) -> Result<PortalEngine, Box<dyn std::error::Error>> {
	let registry = get_registry();

	let storage_factories =
		build_factories!(registry, config.storage.implementations.keys(), storage, "storage");
	let identity_factories =
		build_factories!(registry, [&config.auth.identity], identity, "identity");
	let policy_factories = build_factories!(registry, [&config.auth.policy], policy, "policy");
	let image_factories = build_factories!(registry, [&config.images.engine], images, "image");

	let factories = PortalFactories {
		storage_factories,
		identity_factories,
		policy_factories,
		image_factories,
	};

	Ok(PortalBuilder::new(config).build(factories)?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use portal_config::builders::ConfigBuilder;

	#[test]
	fn test_registry_contents() {
		let registry = get_registry();
		assert!(registry.storage.contains_key("memory"));
		assert!(registry.storage.contains_key("file"));
		assert!(registry.identity.contains_key("static"));
		assert!(registry.policy.contains_key("roles"));
		assert!(registry.images.contains_key("passthrough"));
	}

	#[test]
	fn test_build_from_config() {
		let config = ConfigBuilder::new().build();
		assert!(build_portal_from_config(config).is_ok());
	}

	#[test]
	fn test_unknown_implementation() {
		let mut config = ConfigBuilder::new().build();
		config.auth.policy = "opa".to_string();

		let err = build_portal_from_config(config).err().unwrap();
		assert!(err.to_string().contains("Unknown policy implementation 'opa'"));
	}
}
