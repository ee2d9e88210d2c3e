//! Team pages, gated on `view-team`. Team members have no data source yet.

use super::from_auth;
use portal_core::PortalEngine;
use portal_types::{
	APIError, Capability, Collection, Identity, Record, TeamIndexProps, TeamShowProps, View,
};

async fn require_team(portal: &PortalEngine, caller: &Identity) -> Result<(), APIError> {
	portal
		.auth()
		.require(caller, &Capability::from(Capability::VIEW_TEAM))
		.await
		.map_err(from_auth)
}

pub async fn index(portal: &PortalEngine, caller: &Identity) -> Result<View, APIError> {
	require_team(portal, caller).await?;
	Ok(View::TeamIndex(TeamIndexProps {
		team: Collection::Unimplemented,
	}))
}

pub async fn show(portal: &PortalEngine, id: &str, caller: &Identity) -> Result<View, APIError> {
	require_team(portal, caller).await?;
	tracing::debug!(member = %id, "Team member detail has no data source");
	Ok(View::TeamShow(TeamShowProps {
		member: Record::Unimplemented,
	}))
}
