//! File-based storage backend.
//!
//! Each key maps to one file: `orders:42` is stored at
//! `<storage_path>/orders/42.json`. Writes go to a temporary file that is
//! renamed into place, so readers never observe a partial record.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use portal_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError,
};
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;

pub struct FileStorage {
	base_path: PathBuf,
}

impl FileStorage {
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	/// Converts a storage key to a path below `base_path`.
	///
	/// The namespace becomes a directory. Returns `None` when either part is
	/// empty, a dot segment, or contains a separator, so distinct keys never
	/// share a file and no key addresses a file outside its namespace.
	fn get_file_path(&self, key: &str) -> Option<PathBuf> {
		let plain = |part: &str| {
			!part.is_empty() && part != "." && part != ".." && !part.contains(['/', '\\', ':'])
		};
		match key.split_once(':') {
			Some((namespace, id)) if plain(namespace) && plain(id) => Some(
				self.base_path
					.join(namespace)
					.join(format!("{}.json", id)),
			),
			Some(_) => None,
			None if plain(key) => Some(self.base_path.join(format!("{}.json", key))),
			None => None,
		}
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.get_file_path(key).ok_or(StorageError::NotFound)?;
		match fs::read(&path).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self
			.get_file_path(key)
			.ok_or_else(|| StorageError::Backend(format!("Invalid storage key '{}'", key)))?;

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let Some(path) = self.get_file_path(key) else {
			return Ok(());
		};
		match fs::remove_file(&path).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let Some(path) = self.get_file_path(key) else {
			return Ok(false);
		};
		fs::try_exists(path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}
}

pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(vec![], vec![Field::new("storage_path", FieldType::String)]);
		schema.validate(config)
	}
}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: base directory (default: "./data/storage")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/storage");

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[tokio::test]
	async fn test_basic_operations() {
		let temp_dir = TempDir::new().unwrap();
		let storage = FileStorage::new(temp_dir.path().to_path_buf());

		storage
			.set_bytes("orders:42", br#"{"id":"42"}"#.to_vec())
			.await
			.unwrap();
		assert!(temp_dir.path().join("orders/42.json").exists());
		assert!(storage.exists("orders:42").await.unwrap());
		assert_eq!(
			storage.get_bytes("orders:42").await.unwrap(),
			br#"{"id":"42"}"#.to_vec()
		);

		storage.delete("orders:42").await.unwrap();
		assert!(!storage.exists("orders:42").await.unwrap());
		assert!(matches!(
			storage.get_bytes("orders:42").await,
			Err(StorageError::NotFound)
		));
		// Deleting again is fine
		storage.delete("orders:42").await.unwrap();
	}

	#[tokio::test]
	async fn test_keys_with_separators_are_rejected() {
		let temp_dir = TempDir::new().unwrap();
		let storage = FileStorage::new(temp_dir.path().join("data"));

		for key in ["orders:../../etc/passwd", "orders:a/b", "orders:a:b", "orders:..", "orders:"] {
			assert!(storage.get_file_path(key).is_none(), "{} should be rejected", key);
		}

		storage
			.set_bytes("orders:a_b", br#"{"id":"a_b"}"#.to_vec())
			.await
			.unwrap();
		assert!(storage.exists("orders:a_b").await.unwrap());
		assert!(!storage.exists("orders:a/b").await.unwrap());
		assert!(matches!(
			storage.get_bytes("orders:a/b").await,
			Err(StorageError::NotFound)
		));
		assert!(storage.set_bytes("orders:a/b", b"{}".to_vec()).await.is_err());
		storage.delete("orders:a/b").await.unwrap();
		assert!(storage.exists("orders:a_b").await.unwrap());
	}

	#[test]
	fn test_factory_validates_config() {
		let config: toml::Value = toml::from_str("storage_path = 5").unwrap();
		assert!(matches!(
			create_storage(&config),
			Err(StorageError::Configuration(_))
		));

		let config: toml::Value = toml::from_str("storage_path = \"/tmp/x\"").unwrap();
		assert!(create_storage(&config).is_ok());
	}
}
