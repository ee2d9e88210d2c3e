//! Configuration module for the portal backend.
//!
//! Configuration is loaded from TOML. `${VAR}` and `${VAR:-default}`
//! references are resolved from the environment before parsing, and a file
//! may pull in other files with `include = ["auth.toml", ...]` as long as
//! every top-level section is defined exactly once.

mod loader;

#[cfg(feature = "testing")]
pub mod builders;

use portal_types::ImageAccess;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Configuration error: {0}")]
	Parse(String),
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, drop the echoed input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the portal.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Instance identity and client page settings.
	pub portal: PortalConfig,
	/// HTTP server settings.
	#[serde(default)]
	pub server: ServerConfig,
	/// Data-access backend.
	pub storage: StorageConfig,
	/// Identity resolution and capability policy.
	pub auth: AuthConfig,
	/// Image delegate.
	pub images: ImagesConfig,
}

/// Instance identity and settings shared with the client application.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortalConfig {
	/// Name of this portal instance, used in logs.
	pub id: String,
	/// Version of the client asset bundle. Clients holding another version
	/// are told to reload.
	pub asset_version: String,
	/// Title of the HTML shell.
	#[serde(default = "default_title")]
	pub title: String,
	/// Script that boots the client application.
	#[serde(default = "default_entry_script")]
	pub entry_script: String,
}

fn default_title() -> String {
	"Portal".to_string()
}

fn default_entry_script() -> String {
	"/build/app.js".to_string()
}

/// Configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
	#[serde(default = "default_host")]
	pub host: String,
	#[serde(default = "default_port")]
	pub port: u16,
	/// Request timeout in seconds.
	#[serde(default = "default_timeout")]
	pub timeout_seconds: u64,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			host: default_host(),
			port: default_port(),
			timeout_seconds: default_timeout(),
		}
	}
}

fn default_host() -> String {
	"127.0.0.1".to_string()
}

fn default_port() -> u16 {
	3000
}

fn default_timeout() -> u64 {
	30
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for authentication and authorization.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
	/// Implementation that turns bearer tokens into identities.
	pub identity: String,
	/// Implementation that answers capability checks.
	pub policy: String,
	/// Implementation configurations for both of the above, by name.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the image delegate.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImagesConfig {
	/// Directory holding source images. Also the cache root.
	pub source_root: PathBuf,
	/// Sub-directory of `source_root` where processed images are cached.
	#[serde(default = "default_cache_prefix")]
	pub cache_prefix: String,
	/// Engine implementation to delegate transforms to.
	pub engine: String,
	/// Access rule for image requests. Required.
	pub access: ImageAccess,
	/// `Cache-Control` max-age for served images.
	#[serde(default = "default_max_age")]
	pub max_age_seconds: u64,
	/// Engine configurations by name.
	#[serde(default)]
	pub implementations: HashMap<String, toml::Value>,
}

fn default_cache_prefix() -> String {
	".cache".to_string()
}

fn default_max_age() -> u64 {
	// One year
	31_536_000
}

/// Resolves environment variables in a string.
///
/// Replaces `${VAR_NAME}` with the value of `VAR_NAME`, or with `default`
/// for `${VAR_NAME:-default}` when the variable is unset. Input is limited to
/// 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut missing = None;
	let resolved = re.replace_all(input, |cap: &regex::Captures| {
		let name = &cap[1];
		match (std::env::var(name), cap.get(2)) {
			(Ok(value), _) => value,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				missing.get_or_insert_with(|| name.to_string());
				String::new()
			},
		}
	});

	if let Some(name) = missing {
		return Err(ConfigError::Validation(format!(
			"Environment variable '{}' not found",
			name
		)));
	}

	Ok(resolved.into_owned())
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;

		let mut loader = loader::ConfigLoader::new(base_dir);
		loader.load_config(file_name).await
	}

	/// Validates cross-field constraints serde cannot express.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.portal.id.is_empty() {
			return Err(ConfigError::Validation("Portal ID cannot be empty".into()));
		}
		if self.portal.asset_version.is_empty() {
			return Err(ConfigError::Validation(
				"Portal asset_version cannot be empty".into(),
			));
		}
		if self.server.timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"Server timeout_seconds must be greater than 0".into(),
			));
		}

		// Storage
		if self.storage.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Storage primary implementation cannot be empty".into(),
			));
		}
		if !self
			.storage
			.implementations
			.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary storage '{}' not found in implementations",
				self.storage.primary
			)));
		}

		// Auth
		for (role, name) in [
			("identity", &self.auth.identity),
			("policy", &self.auth.policy),
		] {
			if !self.auth.implementations.contains_key(name) {
				return Err(ConfigError::Validation(format!(
					"Auth {} implementation '{}' not found in auth.implementations",
					role, name
				)));
			}
		}

		// Images
		if self.images.source_root.as_os_str().is_empty() {
			return Err(ConfigError::Validation(
				"Images source_root cannot be empty".into(),
			));
		}
		let mut components = Path::new(&self.images.cache_prefix).components();
		match (components.next(), components.next()) {
			(Some(Component::Normal(_)), None) => {},
			_ => {
				return Err(ConfigError::Validation(format!(
					"Images cache_prefix '{}' must be a single relative directory name",
					self.images.cache_prefix
				)));
			},
		}
		if !self.images.implementations.contains_key(&self.images.engine) {
			return Err(ConfigError::Validation(format!(
				"Image engine '{}' not found in images.implementations",
				self.images.engine
			)));
		}

		Ok(())
	}
}

/// Parses a TOML string, resolving environment variables and validating the
/// result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Config::from_resolved(&resolve_env_vars(s)?)
	}
}

impl Config {
	/// Parses and validates TOML whose environment references are already
	/// resolved.
	pub(crate) fn from_resolved(resolved: &str) -> Result<Self, ConfigError> {
		let config: Config = toml::from_str(resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const BASE: &str = r#"
[portal]
id = "portal-test"
asset_version = "abc123"

[storage]
primary = "memory"
[storage.implementations.memory]

[auth]
identity = "static"
policy = "roles"
[auth.implementations.static]
users = []
[auth.implementations.roles]

[images]
source_root = "/srv/images"
engine = "passthrough"
access = "public"
[images.implementations.passthrough]
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("PORTAL_TEST_HOST", "localhost");
		std::env::set_var("PORTAL_TEST_PORT", "8080");

		let result = resolve_env_vars("host = \"${PORTAL_TEST_HOST}:${PORTAL_TEST_PORT}\"").unwrap();
		assert_eq!(result, "host = \"localhost:8080\"");

		std::env::remove_var("PORTAL_TEST_HOST");
		std::env::remove_var("PORTAL_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let result = resolve_env_vars("value = \"${PORTAL_MISSING_VAR:-fallback}\"").unwrap();
		assert_eq!(result, "value = \"fallback\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let result = resolve_env_vars("value = \"${PORTAL_MISSING_VAR}\"");
		assert!(result
			.unwrap_err()
			.to_string()
			.contains("PORTAL_MISSING_VAR"));
	}

	#[test]
	fn test_parse_with_defaults() {
		let config: Config = BASE.parse().unwrap();
		assert_eq!(config.portal.id, "portal-test");
		assert_eq!(config.portal.title, "Portal");
		assert_eq!(config.server.port, 3000);
		assert_eq!(config.server.host, "127.0.0.1");
		assert_eq!(config.images.cache_prefix, ".cache");
		assert_eq!(config.images.max_age_seconds, 31_536_000);
		assert_eq!(config.images.access, ImageAccess::Public);
	}

	#[test]
	fn test_image_access_is_required() {
		let config = BASE.replace("access = \"public\"\n", "");
		let err = Config::from_str(&config).unwrap_err();
		assert!(err.to_string().contains("access"), "got: {}", err);
	}

	#[test]
	fn test_cache_prefix_must_be_single_segment() {
		for prefix in ["../escape", "a/b", "/abs", ""] {
			let config = BASE.replace(
				"engine = \"passthrough\"",
				&format!("engine = \"passthrough\"\ncache_prefix = \"{}\"", prefix),
			);
			assert!(
				Config::from_str(&config).is_err(),
				"prefix '{}' should be rejected",
				prefix
			);
		}
	}

	#[test]
	fn test_unknown_primary_storage_rejected() {
		let config = BASE.replace("primary = \"memory\"", "primary = \"redis\"");
		let err = Config::from_str(&config).unwrap_err();
		assert!(err
			.to_string()
			.contains("Primary storage 'redis' not found"));
	}

	#[test]
	fn test_unknown_auth_implementation_rejected() {
		let config = BASE.replace("policy = \"roles\"", "policy = \"ldap\"");
		let err = Config::from_str(&config).unwrap_err();
		assert!(err
			.to_string()
			.contains("Auth policy implementation 'ldap' not found"));
	}

	#[test]
	fn test_config_with_env_vars() {
		std::env::set_var("PORTAL_TEST_ASSET_VERSION", "v42");
		let config = BASE.replace("abc123", "${PORTAL_TEST_ASSET_VERSION}");
		let config: Config = config.parse().unwrap();
		assert_eq!(config.portal.asset_version, "v42");
		std::env::remove_var("PORTAL_TEST_ASSET_VERSION");
	}
}
