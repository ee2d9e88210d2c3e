//! Builder pattern for constructing portal engines.
//!
//! Composes a [`PortalEngine`] from the implementations named in the
//! configuration, looking each one up in a factory map. Only implementations
//! that are actually selected are constructed.

use crate::PortalEngine;
use portal_auth::{AuthError, AuthService, IdentityProvider, PolicyInterface};
use portal_config::Config;
use portal_images::{ImageEngine, ImageError, ImageService};
use portal_storage::{StorageError, StorageInterface, StorageService};
use portal_types::ImageAccess;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions for every pluggable component, keyed by name.
pub struct PortalFactories<SF, IF, PF, EF> {
	pub storage_factories: HashMap<String, SF>,
	pub identity_factories: HashMap<String, IF>,
	pub policy_factories: HashMap<String, PF>,
	pub image_factories: HashMap<String, EF>,
}

pub struct PortalBuilder {
	config: Config,
}

impl PortalBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	pub fn build<SF, IF, PF, EF>(
		self,
		factories: PortalFactories<SF, IF, PF, EF>,
	) -> Result<PortalEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
		IF: Fn(&toml::Value) -> Result<Box<dyn IdentityProvider>, AuthError>,
		PF: Fn(&toml::Value) -> Result<Box<dyn PolicyInterface>, AuthError>,
		EF: Fn(&toml::Value) -> Result<Box<dyn ImageEngine>, ImageError>,
	{
		let config = &self.config;

		let backend = create(
			"storage",
			&config.storage.primary,
			&config.storage.implementations,
			&factories.storage_factories,
		)?;
		let storage = Arc::new(StorageService::new(backend));

		let identity = create(
			"identity",
			&config.auth.identity,
			&config.auth.implementations,
			&factories.identity_factories,
		)?;
		let policy = create(
			"policy",
			&config.auth.policy,
			&config.auth.implementations,
			&factories.policy_factories,
		)?;
		let auth = Arc::new(AuthService::new(identity, policy));

		let engine = create(
			"images",
			&config.images.engine,
			&config.images.implementations,
			&factories.image_factories,
		)?;
		let images = Arc::new(ImageService::new(
			config.images.source_root.clone(),
			config.images.cache_prefix.clone(),
			engine,
			config.images.max_age_seconds,
		));

		match &config.images.access {
			ImageAccess::Public => tracing::warn!(
				root = %config.images.source_root.display(),
				"Images are served without authentication"
			),
			access => tracing::info!(access = %access, "Image access restricted"),
		}

		Ok(PortalEngine::new(self.config, storage, auth, images))
	}
}

/// Looks up `name` in both the config table and the factory map and runs
/// the factory.
fn create<T, E, F>(
	component: &'static str,
	name: &str,
	implementations: &HashMap<String, toml::Value>,
	factories: &HashMap<String, F>,
) -> Result<T, BuilderError>
where
	E: Display,
	F: Fn(&toml::Value) -> Result<T, E>,
{
	let config = implementations.get(name).ok_or_else(|| {
		BuilderError::Config(format!(
			"No configuration for {} implementation '{}'",
			component, name
		))
	})?;
	let factory = factories.get(name).ok_or_else(|| {
		BuilderError::MissingComponent(format!("{} implementation '{}'", component, name))
	})?;

	match factory(config) {
		Ok(implementation) => {
			tracing::info!(component = component, implementation = %name, "Loaded");
			Ok(implementation)
		},
		Err(e) => {
			tracing::error!(
				component = component,
				implementation = %name,
				error = %e,
				"Failed to create implementation"
			);
			Err(BuilderError::Config(format!(
				"Failed to create {} implementation '{}': {}",
				component, name, e
			)))
		},
	}
}
