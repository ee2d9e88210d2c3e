//! Page renderer speaking the client-side page protocol.
//!
//! A page is the view name plus its props, the request URL and the asset
//! version. Requests carrying `X-Inertia: true` get the page as JSON; every
//! other request gets an HTML shell with the page embedded in the mount
//! element, from which the client boots.

use crate::server::AppState;
use axum::{
	extract::FromRequestParts,
	http::{header, request::Parts, HeaderMap, HeaderValue, Method, StatusCode},
	response::{Html, IntoResponse, Json, Response},
};
use portal_config::PortalConfig;
use portal_types::{APIError, View};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;

pub const X_INERTIA: &str = "x-inertia";
pub const X_INERTIA_VERSION: &str = "x-inertia-version";
pub const X_INERTIA_LOCATION: &str = "x-inertia-location";
/// Set on responses whose payload is an unimplemented placeholder.
pub const X_PLACEHOLDER_DATA: &str = "x-placeholder-data";

/// The page object sent to the client.
#[derive(Debug, Serialize)]
pub struct Page<'a> {
	pub component: &'a str,
	pub props: serde_json::Value,
	pub url: &'a str,
	pub version: &'a str,
}

/// Shell settings shared by every page.
#[derive(Debug, Clone)]
pub struct PageRenderer {
	version: String,
	title: String,
	entry_script: String,
}

impl PageRenderer {
	pub fn new(config: &PortalConfig) -> Self {
		Self {
			version: config.asset_version.clone(),
			title: config.title.clone(),
			entry_script: config.entry_script.clone(),
		}
	}

	/// Renders `view` for a request described by `request`.
	pub fn render(&self, view: &View, request: &PageRequest) -> Response {
		if request.inertia
			&& request.method == Method::GET
			&& request.version.as_deref() != Some(self.version.as_str())
		{
			tracing::debug!(url = %request.url, "Asset version changed, forcing reload");
			return (
				StatusCode::CONFLICT,
				[(X_INERTIA_LOCATION, header_value(&request.url))],
			)
				.into_response();
		}

		let page = Page {
			component: view.component(),
			props: view.props(),
			url: &request.url,
			version: &self.version,
		};

		let mut response = if request.inertia {
			let mut response = Json(&page).into_response();
			response
				.headers_mut()
				.insert(X_INERTIA, HeaderValue::from_static("true"));
			response
		} else {
			match serde_json::to_string(&page) {
				Ok(json) => Html(self.shell(&json)).into_response(),
				Err(e) => {
					tracing::error!(component = page.component, error = %e, "Failed to encode page");
					return APIError::internal().into_response();
				},
			}
		};

		let headers = response.headers_mut();
		headers.insert(header::VARY, HeaderValue::from_static("X-Inertia"));
		if view.is_placeholder() {
			headers.insert(X_PLACEHOLDER_DATA, HeaderValue::from_static("true"));
		}
		response
	}

	fn shell(&self, page_json: &str) -> String {
		format!(
			"<!DOCTYPE html>\n\
			<html lang=\"en\">\n\
			<head>\n\
			<meta charset=\"utf-8\">\n\
			<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
			<title>{}</title>\n\
			<script type=\"module\" src=\"{}\" defer></script>\n\
			</head>\n\
			<body>\n\
			<div id=\"app\" data-page=\"{}\"></div>\n\
			</body>\n\
			</html>\n",
			escape_html(&self.title),
			escape_html(&self.entry_script),
			escape_html(page_json)
		)
	}
}

/// What the renderer needs to know about the incoming request.
#[derive(Debug, Clone)]
pub struct PageRequest {
	pub inertia: bool,
	pub version: Option<String>,
	pub method: Method,
	/// Path and query as requested.
	pub url: String,
}

impl PageRequest {
	pub fn from_parts(method: &Method, uri: &axum::http::Uri, headers: &HeaderMap) -> Self {
		let inertia = headers
			.get(X_INERTIA)
			.and_then(|v| v.to_str().ok())
			.is_some_and(|v| v.eq_ignore_ascii_case("true"));
		let version = headers
			.get(X_INERTIA_VERSION)
			.and_then(|v| v.to_str().ok())
			.map(str::to_string);
		let url = uri
			.path_and_query()
			.map(|pq| pq.as_str().to_string())
			.unwrap_or_else(|| uri.path().to_string());

		Self {
			inertia,
			version,
			method: method.clone(),
			url,
		}
	}
}

/// Extractor bundling the renderer with the current request.
pub struct Inertia {
	renderer: Arc<PageRenderer>,
	request: PageRequest,
}

impl Inertia {
	pub fn render(&self, view: &View) -> Response {
		self.renderer.render(view, &self.request)
	}
}

impl FromRequestParts<AppState> for Inertia {
	type Rejection = Infallible;

	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
		Ok(Self {
			renderer: Arc::clone(&state.renderer),
			request: PageRequest::from_parts(&parts.method, &parts.uri, &parts.headers),
		})
	}
}

fn header_value(value: &str) -> HeaderValue {
	HeaderValue::from_str(value).unwrap_or_else(|_| HeaderValue::from_static("/"))
}

/// Escapes text for use inside HTML element content or a quoted attribute.
pub fn escape_html(input: &str) -> String {
	let mut escaped = String::with_capacity(input.len());
	for c in input.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#39;"),
			_ => escaped.push(c),
		}
	}
	escaped
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::body::to_bytes;
	use portal_types::{Collection, CustomersIndexProps, EmptyProps, OrderReviewProps, OrderSummary};

	fn renderer() -> PageRenderer {
		PageRenderer {
			version: "v1".to_string(),
			title: "Portal".to_string(),
			entry_script: "/build/app.js".to_string(),
		}
	}

	fn request(inertia: bool, version: Option<&str>) -> PageRequest {
		PageRequest {
			inertia,
			version: version.map(str::to_string),
			method: Method::GET,
			url: "/orders/42/review".to_string(),
		}
	}

	fn review() -> View {
		View::OrderReview(OrderReviewProps {
			order: OrderSummary {
				id: "42".to_string(),
				status: "draft".to_string(),
			},
		})
	}

	async fn body(response: Response) -> String {
		let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
		String::from_utf8(bytes.to_vec()).unwrap()
	}

	#[tokio::test]
	async fn test_json_page() {
		let response = renderer().render(&review(), &request(true, Some("v1")));
		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(response.headers()[X_INERTIA], "true");
		assert_eq!(response.headers()[header::VARY], "X-Inertia");
		assert!(response.headers().get(X_PLACEHOLDER_DATA).is_none());

		let page: serde_json::Value = serde_json::from_str(&body(response).await).unwrap();
		assert_eq!(
			page,
			serde_json::json!({
				"component": "Orders/Review",
				"props": { "order": { "id": "42", "status": "draft" } },
				"url": "/orders/42/review",
				"version": "v1",
			})
		);
	}

	#[tokio::test]
	async fn test_html_shell_escapes_page() {
		let response = renderer().render(&review(), &request(false, None));
		assert_eq!(response.status(), StatusCode::OK);
		assert!(response.headers()[header::CONTENT_TYPE]
			.to_str()
			.unwrap()
			.starts_with("text/html"));

		let html = body(response).await;
		assert!(html.contains("<div id=\"app\" data-page=\"{&quot;component&quot;:&quot;Orders/Review&quot;"));
		assert!(html.contains("<script type=\"module\" src=\"/build/app.js\" defer></script>"));
	}

	#[test]
	fn test_version_mismatch_conflicts() {
		for version in [Some("v0"), None] {
			let response = renderer().render(&review(), &request(true, version));
			assert_eq!(response.status(), StatusCode::CONFLICT);
			assert_eq!(response.headers()[X_INERTIA_LOCATION], "/orders/42/review");
		}

		// Only GET requests are checked.
		let mut post = request(true, Some("v0"));
		post.method = Method::POST;
		assert_eq!(renderer().render(&review(), &post).status(), StatusCode::OK);
	}

	#[test]
	fn test_placeholder_marker() {
		let view = View::CustomersIndex(CustomersIndexProps {
			customers: Collection::Unimplemented,
		});
		let response = renderer().render(&view, &request(true, Some("v1")));
		assert_eq!(response.headers()[X_PLACEHOLDER_DATA], "true");

		let response = renderer().render(&View::OrderIndex(EmptyProps {}), &request(true, Some("v1")));
		assert!(response.headers().get(X_PLACEHOLDER_DATA).is_none());
	}

	#[test]
	fn test_escape_html() {
		assert_eq!(
			escape_html(r#"<a href="x">'&'</a>"#),
			"&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
		);
	}
}
