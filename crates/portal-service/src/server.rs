//! HTTP server for the portal.
//!
//! Page routes require a bearer token and render through the page protocol;
//! image routes apply the configured access rule; `/health` is open.

use crate::apis;
use crate::inertia::{Inertia, PageRenderer};
use crate::middleware;
use axum::{
	extract::{Path, Query, Request, State},
	middleware::from_fn_with_state,
	response::{IntoResponse, Json, Response},
	routing::get,
	Extension, Router, ServiceExt,
};
use portal_core::PortalEngine;
use portal_types::{APIError, Identity, View};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::{Layer, ServiceBuilder};
use tower_http::{
	cors::CorsLayer,
	normalize_path::{NormalizePath, NormalizePathLayer},
	timeout::TimeoutLayer,
	trace::TraceLayer,
};

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
	pub portal: Arc<PortalEngine>,
	pub renderer: Arc<PageRenderer>,
}

/// Builds the router with every route and layer except path normalization.
pub fn build_router(portal: Arc<PortalEngine>) -> Router {
	let timeout = Duration::from_secs(portal.config().server.timeout_seconds);
	let state = AppState {
		renderer: Arc::new(PageRenderer::new(&portal.config().portal)),
		portal,
	};

	let pages = Router::new()
		.route("/customers", get(handle_customers_index))
		.route("/customers/{id}", get(handle_customers_show))
		.route("/eligibility", get(handle_eligibility))
		.route("/orders", get(handle_orders_index))
		.route("/orders/create", get(handle_orders_create))
		.route("/orders/approval", get(handle_orders_approval))
		.route("/orders/{order_id}/review", get(handle_order_review))
		.route("/team", get(handle_team_index))
		.route("/team/{id}", get(handle_team_show))
		.route_layer(from_fn_with_state(state.clone(), middleware::require_identity));

	let images = Router::new()
		.route("/images/{*path}", get(handle_image))
		.route_layer(from_fn_with_state(state.clone(), middleware::identify));

	Router::new()
		.route("/health", get(handle_health))
		.merge(pages)
		.merge(images)
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(TimeoutLayer::new(timeout))
				.layer(CorsLayer::permissive()),
		)
		.with_state(state)
}

/// The router wrapped so `/customers/` and `/customers` route the same.
pub fn build_app(portal: Arc<PortalEngine>) -> NormalizePath<Router> {
	NormalizePathLayer::trim_trailing_slash().layer(build_router(portal))
}

/// Binds the configured address and serves until the process stops.
pub async fn start_server(portal: Arc<PortalEngine>) -> Result<(), Box<dyn std::error::Error>> {
	let server = portal.config().server.clone();
	let app = build_app(portal);

	let bind_address = format!("{}:{}", server.host, server.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Portal server starting on {}", bind_address);

	axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;

	Ok(())
}

/// Renders a handler result, logging failures.
fn respond(inertia: &Inertia, page: &str, result: Result<View, APIError>) -> Result<Response, APIError> {
	match result {
		Ok(view) => Ok(inertia.render(&view)),
		Err(e) => {
			tracing::warn!("{} request failed: {}", page, e);
			Err(e)
		},
	}
}

async fn handle_health() -> Json<serde_json::Value> {
	Json(serde_json::json!({ "status": "ok" }))
}

async fn handle_customers_index(inertia: Inertia) -> Response {
	inertia.render(&apis::customers::index())
}

async fn handle_customers_show(inertia: Inertia, Path(id): Path<String>) -> Response {
	inertia.render(&apis::customers::show(&id))
}

async fn handle_eligibility(
	State(state): State<AppState>,
	Extension(identity): Extension<Identity>,
	inertia: Inertia,
) -> Result<Response, APIError> {
	let result = apis::eligibility::index(&state.portal, &identity).await;
	respond(&inertia, "Eligibility", result)
}

async fn handle_orders_index(inertia: Inertia) -> Response {
	inertia.render(&apis::orders::index())
}

async fn handle_orders_create(inertia: Inertia) -> Response {
	inertia.render(&apis::orders::create())
}

async fn handle_orders_approval(inertia: Inertia) -> Response {
	inertia.render(&apis::orders::approval())
}

async fn handle_order_review(
	State(state): State<AppState>,
	Extension(identity): Extension<Identity>,
	Path(order_id): Path<String>,
	inertia: Inertia,
) -> Result<Response, APIError> {
	let result = apis::orders::review(&state.portal, &order_id, &identity).await;
	respond(&inertia, "Order review", result)
}

async fn handle_team_index(
	State(state): State<AppState>,
	Extension(identity): Extension<Identity>,
	inertia: Inertia,
) -> Result<Response, APIError> {
	let result = apis::team::index(&state.portal, &identity).await;
	respond(&inertia, "Team", result)
}

async fn handle_team_show(
	State(state): State<AppState>,
	Extension(identity): Extension<Identity>,
	Path(id): Path<String>,
	inertia: Inertia,
) -> Result<Response, APIError> {
	let result = apis::team::show(&state.portal, &id, &identity).await;
	respond(&inertia, "Team member", result)
}

async fn handle_image(
	State(state): State<AppState>,
	identity: Option<Extension<Identity>>,
	Path(path): Path<String>,
	Query(query): Query<HashMap<String, String>>,
) -> Result<Response, APIError> {
	let caller = identity.as_ref().map(|Extension(identity)| identity);
	match apis::images::serve(&state.portal, caller, &path, &query).await {
		Ok(response) => Ok(response.into_response()),
		Err(e) => {
			tracing::warn!(path = %path, "Image request failed: {}", e);
			Err(e)
		},
	}
}
