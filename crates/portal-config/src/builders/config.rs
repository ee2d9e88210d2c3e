//! Fluent construction of `Config` values for tests.

use crate::{AuthConfig, Config, ImagesConfig, PortalConfig, ServerConfig, StorageConfig};
use portal_types::ImageAccess;
use std::collections::HashMap;
use std::path::PathBuf;
use toml::{Table, Value};

/// Builds a `Config` wired to the in-memory storage, `static` identity
/// provider, `roles` policy and `passthrough` image engine.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	portal_id: String,
	asset_version: String,
	source_root: PathBuf,
	access: ImageAccess,
	users: Vec<(String, String, Vec<String>)>,
	roles: Vec<(String, Vec<String>)>,
	orders: Vec<Value>,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	pub fn new() -> Self {
		Self {
			portal_id: "test-portal".to_string(),
			asset_version: "test".to_string(),
			source_root: PathBuf::from("./storage/app/public"),
			access: ImageAccess::Public,
			users: Vec::new(),
			roles: Vec::new(),
			orders: Vec::new(),
		}
	}

	pub fn portal_id(mut self, id: impl Into<String>) -> Self {
		self.portal_id = id.into();
		self
	}

	pub fn asset_version(mut self, version: impl Into<String>) -> Self {
		self.asset_version = version.into();
		self
	}

	pub fn source_root(mut self, root: impl Into<PathBuf>) -> Self {
		self.source_root = root.into();
		self
	}

	pub fn image_access(mut self, access: ImageAccess) -> Self {
		self.access = access;
		self
	}

	/// Adds a user that authenticates with `token`.
	pub fn user(mut self, id: &str, token: &str, roles: &[&str]) -> Self {
		self.users.push((
			id.to_string(),
			token.to_string(),
			roles.iter().map(|r| r.to_string()).collect(),
		));
		self
	}

	/// Grants `capabilities` to everyone holding `role`.
	pub fn role(mut self, role: &str, capabilities: &[&str]) -> Self {
		self.roles.push((
			role.to_string(),
			capabilities.iter().map(|c| c.to_string()).collect(),
		));
		self
	}

	/// Preloads an order into the memory backend.
	pub fn order(mut self, id: &str, status: Option<&str>, owner_id: Option<&str>) -> Self {
		let mut order = Table::new();
		order.insert("id".into(), Value::String(id.to_string()));
		if let Some(status) = status {
			order.insert("status".into(), Value::String(status.to_string()));
		}
		if let Some(owner_id) = owner_id {
			order.insert("owner_id".into(), Value::String(owner_id.to_string()));
		}
		self.orders.push(Value::Table(order));
		self
	}

	pub fn build(self) -> Config {
		let strings = |items: Vec<String>| Value::Array(items.into_iter().map(Value::String).collect());

		let users = self
			.users
			.into_iter()
			.map(|(id, token, roles)| {
				let mut user = Table::new();
				user.insert("id".into(), Value::String(id));
				user.insert("token".into(), Value::String(token));
				user.insert("roles".into(), strings(roles));
				Value::Table(user)
			})
			.collect();
		let mut identity = Table::new();
		identity.insert("users".into(), Value::Array(users));

		let mut memory = Table::new();
		if !self.orders.is_empty() {
			memory.insert("orders".into(), Value::Array(self.orders));
		}

		let mut policy = Table::new();
		for (role, capabilities) in self.roles {
			policy.insert(role, strings(capabilities));
		}

		Config {
			portal: PortalConfig {
				id: self.portal_id,
				asset_version: self.asset_version,
				title: "Portal".to_string(),
				entry_script: "/build/app.js".to_string(),
			},
			server: ServerConfig::default(),
			storage: StorageConfig {
				primary: "memory".to_string(),
				implementations: HashMap::from([("memory".to_string(), Value::Table(memory))]),
			},
			auth: AuthConfig {
				identity: "static".to_string(),
				policy: "roles".to_string(),
				implementations: HashMap::from([
					("static".to_string(), Value::Table(identity)),
					("roles".to_string(), Value::Table(policy)),
				]),
			},
			images: ImagesConfig {
				source_root: self.source_root,
				cache_prefix: ".cache".to_string(),
				engine: "passthrough".to_string(),
				access: self.access,
				max_age_seconds: 31_536_000,
				implementations: HashMap::from([(
					"passthrough".to_string(),
					Value::Table(Table::new()),
				)]),
			},
		}
	}
}
