//! Core of the portal backend.
//!
//! [`PortalEngine`] holds the services every request handler needs and is
//! assembled by [`PortalBuilder`] from the implementations named in the
//! configuration.

use portal_auth::{AuthError, AuthService};
use portal_config::Config;
use portal_images::ImageService;
use portal_storage::StorageService;
use portal_types::{Identity, ImageAccess, OrderReviewProps, OrderSummary, View};
use std::sync::Arc;

pub mod builder;
pub mod lookup;

pub use builder::{BuilderError, PortalBuilder, PortalFactories};
pub use lookup::{get_authorized, LookupError};

pub struct PortalEngine {
	config: Config,
	storage: Arc<StorageService>,
	auth: Arc<AuthService>,
	images: Arc<ImageService>,
}

impl PortalEngine {
	pub fn new(
		config: Config,
		storage: Arc<StorageService>,
		auth: Arc<AuthService>,
		images: Arc<ImageService>,
	) -> Self {
		Self {
			config,
			storage,
			auth,
			images,
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn storage(&self) -> &Arc<StorageService> {
		&self.storage
	}

	pub fn auth(&self) -> &Arc<AuthService> {
		&self.auth
	}

	pub fn images(&self) -> &Arc<ImageService> {
		&self.images
	}

	/// The `Orders/Review` view for order `id`, if `caller` may see it.
	pub async fn order_review(&self, id: &str, caller: &Identity) -> Result<View, LookupError> {
		let order = get_authorized(&self.storage, &self.auth, id, caller).await?;
		Ok(View::OrderReview(OrderReviewProps {
			order: OrderSummary::from(&order),
		}))
	}

	/// Applies the configured image access rule to `caller`.
	pub async fn check_image_access(&self, caller: Option<&Identity>) -> Result<(), AuthError> {
		match (&self.config.images.access, caller) {
			(ImageAccess::Public, _) => Ok(()),
			(_, None) => Err(AuthError::Unauthenticated),
			(ImageAccess::Authenticated, Some(_)) => Ok(()),
			(ImageAccess::Capability(capability), Some(identity)) => {
				self.auth.require(identity, capability).await
			},
		}
	}
}
