//! HTTP-facing error types for the portal.
//!
//! Every failure that reaches the HTTP layer is expressed as an [`APIError`],
//! which carries a machine-readable error code and a generic message and knows
//! its status code. Component errors convert into it at the handler boundary.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error response body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
	/// Additional error context
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Structured API error type with appropriate HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Malformed request input (400)
	BadRequest {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// Missing or invalid credentials (401)
	Unauthorized { error_type: String, message: String },
	/// Caller lacks the required capability (403)
	Forbidden { error_type: String, message: String },
	/// Entity or file does not exist (404)
	NotFound { error_type: String, message: String },
	/// Internal server error (500)
	InternalServerError { error_type: String, message: String },
}

impl APIError {
	/// Builds a 404 with the given error code.
	pub fn not_found(error_type: &str, message: impl Into<String>) -> Self {
		APIError::NotFound {
			error_type: error_type.to_string(),
			message: message.into(),
		}
	}

	/// Builds a 403 with the given error code.
	pub fn forbidden(error_type: &str, message: impl Into<String>) -> Self {
		APIError::Forbidden {
			error_type: error_type.to_string(),
			message: message.into(),
		}
	}

	/// Builds a 401 with the standard message.
	pub fn unauthorized() -> Self {
		APIError::Unauthorized {
			error_type: "UNAUTHENTICATED".to_string(),
			message: "Authentication required".to_string(),
		}
	}

	/// Builds a 400 without details.
	pub fn bad_request(error_type: &str, message: impl Into<String>) -> Self {
		APIError::BadRequest {
			error_type: error_type.to_string(),
			message: message.into(),
			details: None,
		}
	}

	/// Builds a 500. The message is kept generic; the cause is logged by the caller.
	pub fn internal() -> Self {
		APIError::InternalServerError {
			error_type: "INTERNAL_ERROR".to_string(),
			message: "An internal error occurred".to_string(),
		}
	}

	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> StatusCode {
		match self {
			APIError::BadRequest { .. } => StatusCode::BAD_REQUEST,
			APIError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
			APIError::Forbidden { .. } => StatusCode::FORBIDDEN,
			APIError::NotFound { .. } => StatusCode::NOT_FOUND,
			APIError::InternalServerError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		match self {
			APIError::BadRequest {
				error_type,
				message,
				details,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: details.clone(),
			},
			APIError::Unauthorized {
				error_type,
				message,
			}
			| APIError::Forbidden {
				error_type,
				message,
			}
			| APIError::NotFound {
				error_type,
				message,
			}
			| APIError::InternalServerError {
				error_type,
				message,
			} => ErrorResponse {
				error: error_type.clone(),
				message: message.clone(),
				details: None,
			},
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			APIError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			APIError::Unauthorized { message, .. } => write!(f, "Unauthorized: {}", message),
			APIError::Forbidden { message, .. } => write!(f, "Forbidden: {}", message),
			APIError::NotFound { message, .. } => write!(f, "Not Found: {}", message),
			APIError::InternalServerError { message, .. } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for APIError {}

impl IntoResponse for APIError {
	fn into_response(self) -> Response {
		let status = self.status_code();
		(status, Json(self.to_error_response())).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_codes() {
		assert_eq!(
			APIError::not_found("ORDER_NOT_FOUND", "x").status_code(),
			StatusCode::NOT_FOUND
		);
		assert_eq!(
			APIError::forbidden("FORBIDDEN", "x").status_code(),
			StatusCode::FORBIDDEN
		);
		assert_eq!(
			APIError::unauthorized().status_code(),
			StatusCode::UNAUTHORIZED
		);
		assert_eq!(
			APIError::bad_request("INVALID_OPTIONS", "x").status_code(),
			StatusCode::BAD_REQUEST
		);
		assert_eq!(
			APIError::internal().status_code(),
			StatusCode::INTERNAL_SERVER_ERROR
		);
	}

	#[test]
	fn test_error_response_omits_empty_details() {
		let body = serde_json::to_value(APIError::not_found("ORDER_NOT_FOUND", "gone").to_error_response())
			.unwrap();
		assert_eq!(body["error"], "ORDER_NOT_FOUND");
		assert_eq!(body["message"], "gone");
		assert!(body.get("details").is_none());
	}

	#[test]
	fn test_into_response_status() {
		let response = APIError::forbidden("FORBIDDEN", "no").into_response();
		assert_eq!(response.status(), StatusCode::FORBIDDEN);
	}
}
