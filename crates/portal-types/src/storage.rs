//! Storage namespaces used by the portal.

/// Namespaces for entity collections held by the data-access layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// Order records, keyed by order id.
	Orders,
}

impl StorageKey {
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Orders => "orders",
		}
	}
}
