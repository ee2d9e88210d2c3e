//! Order pages.
//!
//! The index, create and approval views mount without data; the client
//! fetches what it needs. The review view loads the order and checks that
//! the caller may view it.

use super::from_lookup;
use portal_core::PortalEngine;
use portal_types::{APIError, EmptyProps, Identity, View};

pub fn index() -> View {
	View::OrderIndex(EmptyProps {})
}

pub fn create() -> View {
	View::OrderCreate(EmptyProps {})
}

pub fn approval() -> View {
	View::OrderApproval(EmptyProps {})
}

pub async fn review(portal: &PortalEngine, id: &str, caller: &Identity) -> Result<View, APIError> {
	portal.order_review(id, caller).await.map_err(from_lookup)
}
