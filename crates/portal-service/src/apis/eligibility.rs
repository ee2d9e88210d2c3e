//! Eligibility page, gated on `view-eligibility`.

use super::from_auth;
use portal_core::PortalEngine;
use portal_types::{APIError, Capability, EmptyProps, Identity, View};

pub async fn index(portal: &PortalEngine, caller: &Identity) -> Result<View, APIError> {
	portal
		.auth()
		.require(caller, &Capability::from(Capability::VIEW_ELIGIBILITY))
		.await
		.map_err(from_auth)?;
	Ok(View::EligibilityIndex(EmptyProps {}))
}
