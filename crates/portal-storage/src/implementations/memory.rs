//! In-memory storage backend.
//!
//! Data lives in a `HashMap` behind a read-write lock and is lost on restart.
//! The backend can be seeded from configuration:
//!
//! ```toml
//! [storage.implementations.memory]
//! orders = [{ id = "42", owner_id = "1" }, { id = "7", status = "approved" }]
//! ```

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use portal_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Order, Schema, StorageKey,
	ValidationError,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct MemoryStorage {
	store: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self::with_entries(HashMap::new())
	}

	fn with_entries(entries: HashMap<String, Vec<u8>>) -> Self {
		Self {
			store: Arc::new(RwLock::new(entries)),
		}
	}
}

impl Default for MemoryStorage {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl StorageInterface for MemoryStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let store = self.store.read().await;
		store.get(key).cloned().ok_or(StorageError::NotFound)
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let mut store = self.store.write().await;
		store.insert(key.to_string(), value);
		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let mut store = self.store.write().await;
		store.remove(key);
		Ok(())
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let store = self.store.read().await;
		Ok(store.contains_key(key))
	}
}

pub struct MemoryStorageSchema;

impl ConfigSchema for MemoryStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![Field::new("orders", FieldType::Array(Box::new(FieldType::Table)))],
		);
		schema.validate(config)
	}
}

/// Factory function to create a memory storage backend from configuration.
///
/// Configuration parameters:
/// - `orders`: optional array of order tables to preload
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	MemoryStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let mut entries = HashMap::new();
	let seeds = config
		.get("orders")
		.and_then(|v| v.as_array())
		.cloned()
		.unwrap_or_default();
	for seed in seeds {
		let order: Order = seed
			.try_into()
			.map_err(|e: toml::de::Error| StorageError::Configuration(e.to_string()))?;
		let bytes =
			serde_json::to_vec(&order).map_err(|e| StorageError::Serialization(e.to_string()))?;
		entries.insert(format!("{}:{}", StorageKey::Orders.as_str(), order.id), bytes);
	}

	if !entries.is_empty() {
		tracing::debug!(count = entries.len(), "Seeded memory storage");
	}
	Ok(Box::new(MemoryStorage::with_entries(entries)))
}

pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_basic_operations() {
		let storage = MemoryStorage::new();
		let key = "test_key";
		let value = b"test_value".to_vec();

		storage.set_bytes(key, value.clone()).await.unwrap();
		assert_eq!(storage.get_bytes(key).await.unwrap(), value);
		assert!(storage.exists(key).await.unwrap());

		storage.delete(key).await.unwrap();
		assert!(!storage.exists(key).await.unwrap());
		assert!(matches!(
			storage.get_bytes(key).await,
			Err(StorageError::NotFound)
		));
	}

	#[tokio::test]
	async fn test_overwrite() {
		let storage = MemoryStorage::new();
		storage.set_bytes("k", b"value1".to_vec()).await.unwrap();
		storage.set_bytes("k", b"value2".to_vec()).await.unwrap();
		assert_eq!(storage.get_bytes("k").await.unwrap(), b"value2".to_vec());
	}

	#[tokio::test]
	async fn test_factory_seeds_orders() {
		let config: toml::Value = toml::from_str(
			r#"orders = [{ id = "42" }, { id = "7", status = "approved", owner_id = "u1" }]"#,
		)
		.unwrap();
		let storage = create_storage(&config).unwrap();

		let bytes = storage.get_bytes("orders:7").await.unwrap();
		let order: Order = serde_json::from_slice(&bytes).unwrap();
		assert_eq!(order.status.as_deref(), Some("approved"));
		assert!(storage.exists("orders:42").await.unwrap());
	}

	#[test]
	fn test_factory_rejects_malformed_seed() {
		let config: toml::Value = toml::from_str(r#"orders = [{ status = "draft" }]"#).unwrap();
		assert!(matches!(
			create_storage(&config),
			Err(StorageError::Configuration(_))
		));

		let config: toml::Value = toml::from_str(r#"orders = "nope""#).unwrap();
		assert!(create_storage(&config).is_err());
	}
}
