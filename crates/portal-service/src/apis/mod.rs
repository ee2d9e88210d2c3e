//! Request handling per resource area.
//!
//! Each module turns a request into a [`portal_types::View`] (or image
//! bytes); rendering and routing live in `server.rs`. The functions below
//! map component errors onto [`APIError`].

use portal_auth::AuthError;
use portal_core::LookupError;
use portal_images::ImageError;
use portal_types::APIError;

pub mod customers;
pub mod eligibility;
pub mod images;
pub mod orders;
pub mod team;

pub fn from_auth(err: AuthError) -> APIError {
	match err {
		AuthError::Unauthenticated => APIError::unauthorized(),
		AuthError::Forbidden(capability) => APIError::forbidden(
			"FORBIDDEN",
			format!("Missing capability '{}'", capability),
		),
		AuthError::Configuration(_) | AuthError::Backend(_) => {
			tracing::error!(error = %err, "Authorization backend failed");
			APIError::internal()
		},
	}
}

pub fn from_lookup(err: LookupError) -> APIError {
	match err {
		LookupError::NotFound(id) => {
			APIError::not_found("ORDER_NOT_FOUND", format!("Order {} not found", id))
		},
		LookupError::Forbidden(capability) => APIError::forbidden(
			"FORBIDDEN",
			format!("Missing capability '{}'", capability),
		),
		LookupError::Auth(e) => from_auth(e),
		LookupError::Storage(e) => {
			tracing::error!(error = %e, "Order storage failed");
			APIError::internal()
		},
	}
}

pub fn from_image(err: ImageError) -> APIError {
	match err {
		ImageError::NotFound(_) | ImageError::Unreadable(_) => {
			APIError::not_found("IMAGE_NOT_FOUND", "Image not found")
		},
		ImageError::BadRequest(message) => APIError::bad_request("INVALID_IMAGE_OPTIONS", message),
		ImageError::Io(_) | ImageError::Configuration(_) => {
			tracing::error!(error = %err, "Image delegate failed");
			APIError::internal()
		},
	}
}
