//! Entity lookup with authorization.

use portal_auth::{AuthError, AuthService};
use portal_storage::{StorageError, StorageService};
use portal_types::{Capability, Identity, Order, Resource, StorageKey};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
	#[error("Order not found: {0}")]
	NotFound(String),
	#[error("Forbidden: missing capability '{0}'")]
	Forbidden(Capability),
	#[error("Storage error: {0}")]
	Storage(StorageError),
	#[error("Authorization error: {0}")]
	Auth(AuthError),
}

impl From<AuthError> for LookupError {
	fn from(err: AuthError) -> Self {
		match err {
			AuthError::Forbidden(capability) => LookupError::Forbidden(capability),
			other => LookupError::Auth(other),
		}
	}
}

/// Fetches order `id` and checks that `caller` may view it.
///
/// Existence is checked first, so an unknown id is `NotFound` for every
/// caller. A known order the caller may not view is `Forbidden`.
pub async fn get_authorized(
	storage: &StorageService,
	auth: &AuthService,
	id: &str,
	caller: &Identity,
) -> Result<Order, LookupError> {
	let order: Order = match storage.retrieve(StorageKey::Orders, id).await {
		Ok(order) => order,
		Err(StorageError::NotFound) => return Err(LookupError::NotFound(id.to_string())),
		Err(e) => return Err(LookupError::Storage(e)),
	};
	if order.id != id {
		tracing::warn!(requested = %id, stored = %order.id, "Stored order id does not match its key");
		return Err(LookupError::NotFound(id.to_string()));
	}

	auth.require_on(caller, &Capability::from(Capability::VIEW), Resource::Order(&order))
		.await?;

	Ok(order)
}
