//! Bearer-token authentication for the HTTP layer.
//!
//! Resolved identities are stored in the request extensions, where handlers
//! pick them up with `Extension<Identity>`.

use crate::server::AppState;
use axum::{
	extract::{Request, State},
	http::{header, HeaderMap},
	middleware::Next,
	response::Response,
};
use portal_types::APIError;

/// Extracts the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
	let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
	let (scheme, token) = value.split_once(' ')?;
	let token = token.trim();
	(scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Rejects the request with 401 unless it carries a valid bearer token.
pub async fn require_identity(
	State(state): State<AppState>,
	mut request: Request,
	next: Next,
) -> Result<Response, APIError> {
	let Some(token) = bearer_token(request.headers()).map(str::to_string) else {
		tracing::debug!(path = %request.uri().path(), "Missing bearer token");
		return Err(APIError::unauthorized());
	};

	let identity = state
		.portal
		.auth()
		.authenticate(&token)
		.await
		.map_err(crate::apis::from_auth)?;

	request.extensions_mut().insert(identity);
	Ok(next.run(request).await)
}

/// Attaches an identity when the request carries a valid bearer token and
/// passes every request through.
pub async fn identify(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
	if let Some(token) = bearer_token(request.headers()).map(str::to_string) {
		match state.portal.auth().authenticate(&token).await {
			Ok(identity) => {
				request.extensions_mut().insert(identity);
			},
			Err(e) => tracing::debug!(error = %e, "Ignoring unusable bearer token"),
		}
	}
	next.run(request).await
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::http::HeaderValue;

	fn headers(value: &str) -> HeaderMap {
		let mut headers = HeaderMap::new();
		headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
		headers
	}

	#[test]
	fn test_bearer_token() {
		assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
		assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
		assert_eq!(bearer_token(&headers("Basic abc")), None);
		assert_eq!(bearer_token(&headers("Bearer ")), None);
		assert_eq!(bearer_token(&headers("Bearer")), None);
		assert_eq!(bearer_token(&HeaderMap::new()), None);
	}
}
