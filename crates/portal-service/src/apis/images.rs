//! Image delivery.
//!
//! Applies the configured access rule, parses the query into image options
//! and streams the delegate's result back with long-lived cache headers.

use super::{from_auth, from_image};
use axum::{
	body::Body,
	http::{header, HeaderValue},
	response::{IntoResponse, Response},
};
use chrono::{DateTime, TimeDelta, Utc};
use portal_core::PortalEngine;
use portal_images::{ImageOptions, ServedImage};
use portal_types::{APIError, Identity};
use std::collections::HashMap;

pub async fn serve(
	portal: &PortalEngine,
	caller: Option<&Identity>,
	path: &str,
	query: &HashMap<String, String>,
) -> Result<Response, APIError> {
	portal.check_image_access(caller).await.map_err(from_auth)?;

	let options = ImageOptions::parse(query).map_err(from_image)?;
	let image = portal.images().serve(path, &options).await.map_err(from_image)?;

	Ok(image_response(image, Utc::now()))
}

fn image_response(image: ServedImage, now: DateTime<Utc>) -> Response {
	let expires = i64::try_from(image.max_age)
		.ok()
		.and_then(TimeDelta::try_seconds)
		.and_then(|max_age| now.checked_add_signed(max_age))
		.unwrap_or(now);

	let headers = [
		(header::CONTENT_TYPE, HeaderValue::from_static(image.content_type())),
		(
			header::CACHE_CONTROL,
			header_value(format!("public, max-age={}", image.max_age)),
		),
		(
			header::EXPIRES,
			header_value(expires.format("%a, %d %b %Y %H:%M:%S GMT").to_string()),
		),
		(header::CONTENT_LENGTH, header_value(image.bytes.len().to_string())),
	];

	(headers, Body::from(image.bytes)).into_response()
}

fn header_value(value: String) -> HeaderValue {
	// Only ever called with ASCII digits, letters and punctuation.
	HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static(""))
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::body::to_bytes;
	use bytes::Bytes;
	use chrono::TimeZone;
	use portal_images::ImageFormat;

	#[tokio::test]
	async fn test_image_response_headers() {
		let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
		let image = ServedImage {
			bytes: Bytes::from_static(b"\x89PNG\r\n\x1a\nrest"),
			format: ImageFormat::Png,
			max_age: 86_400,
		};

		let response = image_response(image, now);
		let headers = response.headers();
		assert_eq!(headers[header::CONTENT_TYPE], "image/png");
		assert_eq!(headers[header::CACHE_CONTROL], "public, max-age=86400");
		assert_eq!(headers[header::EXPIRES], "Tue, 02 Jan 2024 00:00:00 GMT");
		assert_eq!(headers[header::CONTENT_LENGTH], "12");

		let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
		assert_eq!(body.len(), 12);
	}
}
