//! Storage module for the portal.
//!
//! This is the data-access layer entity lookups go through. Backends deal in
//! raw bytes under string keys; [`StorageService`] adds JSON (de)serialization
//! and `namespace:id` keys on top.

use async_trait::async_trait;
use portal_types::{ImplementationRegistry, StorageKey};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	#[error("Not found")]
	NotFound,
	#[error("Serialization error: {0}")]
	Serialization(String),
	#[error("Backend error: {0}")]
	Backend(String),
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Low-level key-value interface every storage backend implements.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key, or `NotFound`.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes, replacing any previous value.
	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Deletes the value for `key`. Deleting a missing key succeeds.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}

/// Signature every storage implementation's factory has.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// All storage implementations as (name, factory) pairs.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Typed storage operations over a backend.
pub struct StorageService {
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	fn key(namespace: StorageKey, id: &str) -> String {
		format!("{}:{}", namespace.as_str(), id)
	}

	/// Serializes `data` to JSON and stores it under `namespace:id`.
	pub async fn store<T: Serialize>(
		&self,
		namespace: StorageKey,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend.set_bytes(&Self::key(namespace, id), bytes).await
	}

	/// Retrieves and deserializes the value under `namespace:id`.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: StorageKey,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&Self::key(namespace, id)).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	pub async fn remove(&self, namespace: StorageKey, id: &str) -> Result<(), StorageError> {
		self.backend.delete(&Self::key(namespace, id)).await
	}

	pub async fn exists(&self, namespace: StorageKey, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&Self::key(namespace, id)).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use implementations::memory::MemoryStorage;
	use portal_types::Order;

	#[tokio::test]
	async fn test_typed_round_trip_and_remove() {
		let service = StorageService::new(Box::new(MemoryStorage::new()));
		let order = Order {
			id: "42".into(),
			status: None,
			owner_id: Some("u1".into()),
		};

		service.store(StorageKey::Orders, "42", &order).await.unwrap();
		assert!(service.exists(StorageKey::Orders, "42").await.unwrap());

		let loaded: Order = service.retrieve(StorageKey::Orders, "42").await.unwrap();
		assert_eq!(loaded, order);

		service.remove(StorageKey::Orders, "42").await.unwrap();
		let missing = service.retrieve::<Order>(StorageKey::Orders, "42").await;
		assert!(matches!(missing, Err(StorageError::NotFound)));
	}

	#[tokio::test]
	async fn test_retrieve_malformed_json() {
		let backend = MemoryStorage::new();
		backend
			.set_bytes("orders:1", b"not json".to_vec())
			.await
			.unwrap();
		let service = StorageService::new(Box::new(backend));
		let result = service.retrieve::<Order>(StorageKey::Orders, "1").await;
		assert!(matches!(result, Err(StorageError::Serialization(_))));
	}

	#[test]
	fn test_all_implementations_registered() {
		let names: Vec<_> = get_all_implementations()
			.into_iter()
			.map(|(name, _)| name)
			.collect();
		assert!(names.contains(&"memory"));
		assert!(names.contains(&"file"));
	}
}
