//! Multi-file configuration loading.
//!
//! A root file may list other files under `include`. Included files are
//! merged section by section; a top-level section defined in two files is an
//! error, as is a file that ends up included twice.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

pub struct ConfigLoader {
	/// Directory relative includes are resolved against
	base_path: PathBuf,
	/// Canonical paths already read
	loaded_files: HashSet<PathBuf>,
	/// Top-level section name -> file that defined it
	section_sources: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	pub fn new(base_path: impl AsRef<Path>) -> Self {
		Self {
			base_path: base_path.as_ref().to_path_buf(),
			loaded_files: HashSet::new(),
			section_sources: HashMap::new(),
		}
	}

	/// Loads a configuration file together with everything it includes.
	pub async fn load_config(&mut self, config_path: impl AsRef<Path>) -> Result<Config, ConfigError> {
		let config_path = self.resolve_path(config_path)?;
		let content = self.load_file(&config_path).await?;
		let mut root: toml::Value = toml::from_str(&content)?;

		let includes = extract_includes(&root)?;
		if includes.is_empty() {
			return Config::from_resolved(&content);
		}

		let table = root
			.as_table_mut()
			.ok_or_else(|| ConfigError::Parse("Configuration root must be a table".into()))?;
		table.remove("include");
		for key in table.keys() {
			self.section_sources.insert(key.clone(), config_path.clone());
		}

		for include in includes {
			let include_path = self.resolve_path(&include)?;
			let include_content = self.load_file(&include_path).await?;
			let include_toml: toml::Value = toml::from_str(&include_content)?;
			let Some(include_table) = include_toml.as_table() else {
				continue;
			};

			for (key, value) in include_table {
				if let Some(existing) = self.section_sources.get(key) {
					return Err(ConfigError::Validation(format!(
						"Duplicate section '{}' found in {} and {}. \
						Each top-level section must be unique across all configuration files.",
						key,
						existing.display(),
						include_path.display()
					)));
				}
				self.section_sources
					.insert(key.clone(), include_path.clone());
				table.insert(key.clone(), value.clone());
			}
			tracing::debug!("Included configuration from {}", include_path.display());
		}

		let combined = toml::to_string(&root).map_err(|e| {
			ConfigError::Parse(format!("Failed to serialize combined config: {}", e))
		})?;
		Config::from_resolved(&combined)
	}

	/// Reads a file once and resolves environment variables in it.
	async fn load_file(&mut self, path: &Path) -> Result<String, ConfigError> {
		let canonical = tokio::fs::canonicalize(path).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Cannot resolve path {}: {}", path.display(), e),
			))
		})?;

		if !self.loaded_files.insert(canonical.clone()) {
			return Err(ConfigError::Validation(format!(
				"Circular include detected: {} was already loaded",
				canonical.display()
			)));
		}

		let content = tokio::fs::read_to_string(path).await?;
		resolve_env_vars(&content)
	}

	fn resolve_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
		let path = path.as_ref();
		let resolved = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.base_path.join(path)
		};

		if !resolved.exists() {
			return Err(ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Configuration file not found: {}", resolved.display()),
			)));
		}

		Ok(resolved)
	}
}

/// Reads `include` as either one path or an array of paths.
fn extract_includes(toml: &toml::Value) -> Result<Vec<PathBuf>, ConfigError> {
	match toml.get("include") {
		None => Ok(Vec::new()),
		Some(toml::Value::String(path)) => Ok(vec![PathBuf::from(path)]),
		Some(toml::Value::Array(items)) => items
			.iter()
			.map(|item| {
				item.as_str().map(PathBuf::from).ok_or_else(|| {
					ConfigError::Validation("Include array must contain only strings".into())
				})
			})
			.collect(),
		Some(_) => Err(ConfigError::Validation(
			"Include must be a string or array of strings".into(),
		)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::TempDir;

	const PORTAL: &str = r#"
[portal]
id = "portal-test"
asset_version = "1"
"#;

	const REST: &str = r#"
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
access = "authenticated"
[images.implementations.passthrough]
"#;

	#[tokio::test]
	async fn test_single_file_config() {
		let temp_dir = TempDir::new().unwrap();
		fs::write(
			temp_dir.path().join("portal.toml"),
			format!("{}{}", PORTAL, REST),
		)
		.unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let config = loader.load_config("portal.toml").await.unwrap();
		assert_eq!(config.portal.id, "portal-test");
	}

	#[tokio::test]
	async fn test_config_with_includes() {
		let temp_dir = TempDir::new().unwrap();
		fs::write(
			temp_dir.path().join("main.toml"),
			format!("include = [\"rest.toml\"]\n{}", PORTAL),
		)
		.unwrap();
		fs::write(temp_dir.path().join("rest.toml"), REST).unwrap();

		let config = Config::from_file(temp_dir.path().join("main.toml").to_str().unwrap())
			.await
			.unwrap();
		assert_eq!(config.portal.id, "portal-test");
		assert_eq!(config.storage.primary, "memory");
	}

	#[tokio::test]
	async fn test_single_string_include() {
		let temp_dir = TempDir::new().unwrap();
		fs::write(
			temp_dir.path().join("main.toml"),
			format!("include = \"rest.toml\"\n{}", PORTAL),
		)
		.unwrap();
		fs::write(temp_dir.path().join("rest.toml"), REST).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		assert!(loader.load_config("main.toml").await.is_ok());
	}

	#[tokio::test]
	async fn test_duplicate_section_error() {
		let temp_dir = TempDir::new().unwrap();
		fs::write(
			temp_dir.path().join("main.toml"),
			format!("include = [\"dup.toml\"]\n{}", PORTAL),
		)
		.unwrap();
		fs::write(temp_dir.path().join("dup.toml"), PORTAL).unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let error = loader.load_config("main.toml").await.unwrap_err();
		assert!(error.to_string().contains("Duplicate section 'portal'"));
	}

	#[tokio::test]
	async fn test_self_include_detection() {
		let temp_dir = TempDir::new().unwrap();
		fs::write(
			temp_dir.path().join("self.toml"),
			format!("include = [\"self.toml\"]\n{}", PORTAL),
		)
		.unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let error = loader.load_config("self.toml").await.unwrap_err();
		assert!(error.to_string().contains("already loaded"));
	}

	#[tokio::test]
	async fn test_env_values_resolved_once() {
		let temp_dir = TempDir::new().unwrap();
		std::env::set_var("PORTAL_LOADER_VERSION", "${PORTAL_LOADER_UNSET}");
		fs::write(
			temp_dir.path().join("main.toml"),
			format!(
				"include = [\"rest.toml\"]\n{}",
				PORTAL.replace("asset_version = \"1\"", "asset_version = \"${PORTAL_LOADER_VERSION}\"")
			),
		)
		.unwrap();
		fs::write(temp_dir.path().join("rest.toml"), REST).unwrap();

		let result = Config::from_file(temp_dir.path().join("main.toml").to_str().unwrap()).await;
		std::env::remove_var("PORTAL_LOADER_VERSION");
		assert_eq!(result.unwrap().portal.asset_version, "${PORTAL_LOADER_UNSET}");
	}

	#[tokio::test]
	async fn test_missing_include() {
		let temp_dir = TempDir::new().unwrap();
		fs::write(
			temp_dir.path().join("main.toml"),
			format!("include = [\"nope.toml\"]\n{}", PORTAL),
		)
		.unwrap();

		let mut loader = ConfigLoader::new(temp_dir.path());
		let error = loader.load_config("main.toml").await.unwrap_err();
		assert!(error.to_string().contains("not found"));
	}
}
