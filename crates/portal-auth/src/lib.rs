//! Authentication and authorization for the portal.
//!
//! Two pluggable interfaces cover the two questions a request asks:
//! [`IdentityProvider`] turns a bearer token into an [`Identity`], and
//! [`PolicyInterface`] decides whether that identity holds a capability,
//! either globally or on a specific entity. [`AuthService`] combines one of
//! each and maps negative answers to [`AuthError`].

use async_trait::async_trait;
use portal_types::{Capability, Identity, ImplementationRegistry, Resource};
use thiserror::Error;

pub mod implementations {
	pub mod roles;
	pub mod static_tokens;
}

/// Errors that can occur during authentication or authorization.
#[derive(Debug, Error)]
pub enum AuthError {
	#[error("Authentication required")]
	Unauthenticated,
	#[error("Missing capability: {0}")]
	Forbidden(Capability),
	#[error("Configuration error: {0}")]
	Configuration(String),
	#[error("Backend error: {0}")]
	Backend(String),
}

/// Resolves credentials to identities.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
	/// Returns the identity owning `token`, or `None` for unknown tokens.
	async fn authenticate(&self, token: &str) -> Result<Option<Identity>, AuthError>;
}

/// Answers capability checks.
#[async_trait]
pub trait PolicyInterface: Send + Sync {
	/// Whether `identity` holds `capability` globally.
	async fn has_capability(
		&self,
		identity: &Identity,
		capability: &Capability,
	) -> Result<bool, AuthError>;

	/// Whether `identity` holds `capability` on `resource`.
	async fn authorize(
		&self,
		identity: &Identity,
		capability: &Capability,
		resource: Resource<'_>,
	) -> Result<bool, AuthError>;
}

pub type IdentityFactory = fn(&toml::Value) -> Result<Box<dyn IdentityProvider>, AuthError>;
pub type PolicyFactory = fn(&toml::Value) -> Result<Box<dyn PolicyInterface>, AuthError>;

pub trait IdentityRegistry: ImplementationRegistry<Factory = IdentityFactory> {}
pub trait PolicyRegistry: ImplementationRegistry<Factory = PolicyFactory> {}

/// All identity provider implementations as (name, factory) pairs.
pub fn get_all_identity_implementations() -> Vec<(&'static str, IdentityFactory)> {
	use implementations::static_tokens;

	vec![(static_tokens::Registry::NAME, static_tokens::Registry::factory())]
}

/// All policy implementations as (name, factory) pairs.
pub fn get_all_policy_implementations() -> Vec<(&'static str, PolicyFactory)> {
	use implementations::roles;

	vec![(roles::Registry::NAME, roles::Registry::factory())]
}

/// Identity resolution plus capability enforcement.
pub struct AuthService {
	identity: Box<dyn IdentityProvider>,
	policy: Box<dyn PolicyInterface>,
}

impl AuthService {
	pub fn new(identity: Box<dyn IdentityProvider>, policy: Box<dyn PolicyInterface>) -> Self {
		Self { identity, policy }
	}

	/// Resolves a bearer token, failing with `Unauthenticated` when unknown.
	pub async fn authenticate(&self, token: &str) -> Result<Identity, AuthError> {
		self.identity
			.authenticate(token)
			.await?
			.ok_or(AuthError::Unauthenticated)
	}

	/// Fails with `Forbidden` unless `identity` holds `capability`.
	pub async fn require(&self, identity: &Identity, capability: &Capability) -> Result<(), AuthError> {
		if self.policy.has_capability(identity, capability).await? {
			Ok(())
		} else {
			tracing::debug!(user = %identity.id, capability = %capability, "Capability denied");
			Err(AuthError::Forbidden(capability.clone()))
		}
	}

	/// Fails with `Forbidden` unless `identity` holds `capability` on `resource`.
	pub async fn require_on(
		&self,
		identity: &Identity,
		capability: &Capability,
		resource: Resource<'_>,
	) -> Result<(), AuthError> {
		if self.policy.authorize(identity, capability, resource).await? {
			Ok(())
		} else {
			tracing::debug!(user = %identity.id, capability = %capability, "Resource access denied");
			Err(AuthError::Forbidden(capability.clone()))
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use implementations::{roles, static_tokens};
	use portal_types::Order;

	fn service() -> AuthService {
		let users: toml::Value = toml::from_str(
			r#"users = [
				{ id = "1", token = "admin-token", roles = ["admin"] },
				{ id = "2", token = "rep-token", roles = ["rep"] },
			]"#,
		)
		.unwrap();
		let policy: toml::Value =
			toml::from_str(r#"admin = ["view-eligibility", "view-orders"]"#).unwrap();

		AuthService::new(
			static_tokens::create_identity_provider(&users).unwrap(),
			roles::create_policy(&policy).unwrap(),
		)
	}

	#[tokio::test]
	async fn test_authenticate() {
		let auth = service();
		assert_eq!(auth.authenticate("admin-token").await.unwrap().id, "1");
		assert!(matches!(
			auth.authenticate("bogus").await,
			Err(AuthError::Unauthenticated)
		));
	}

	#[tokio::test]
	async fn test_require() {
		let auth = service();
		let admin = auth.authenticate("admin-token").await.unwrap();
		let rep = auth.authenticate("rep-token").await.unwrap();
		let capability = Capability::from(Capability::VIEW_ELIGIBILITY);

		assert!(auth.require(&admin, &capability).await.is_ok());
		assert!(matches!(
			auth.require(&rep, &capability).await,
			Err(AuthError::Forbidden(c)) if c == capability
		));
	}

	#[tokio::test]
	async fn test_require_on_order() {
		let auth = service();
		let rep = auth.authenticate("rep-token").await.unwrap();
		let view = Capability::from(Capability::VIEW);

		let own = Order {
			id: "1".into(),
			status: None,
			owner_id: Some("2".into()),
		};
		let other = Order {
			id: "2".into(),
			status: None,
			owner_id: Some("9".into()),
		};

		assert!(auth.require_on(&rep, &view, Resource::Order(&own)).await.is_ok());
		assert!(auth
			.require_on(&rep, &view, Resource::Order(&other))
			.await
			.is_err());
	}

	#[test]
	fn test_implementations_registered() {
		assert_eq!(get_all_identity_implementations()[0].0, "static");
		assert_eq!(get_all_policy_implementations()[0].0, "roles");
	}
}
