//! Image delegate for the portal.
//!
//! [`ImageService`] maps a request path and query string onto a source file
//! below a fixed root, serves cached results from a sub-directory of that
//! root, and hands cache misses to a pluggable [`ImageEngine`]. The engine
//! owns every pixel-level decision; this crate only scopes paths, validates
//! options and manages the cache.

use async_trait::async_trait;
use bytes::Bytes;
use portal_types::ImplementationRegistry;
use thiserror::Error;

pub mod format;
pub mod options;
pub mod service;

pub mod implementations {
	pub mod passthrough;
}

pub use format::ImageFormat;
pub use options::{Fit, ImageOptions};
pub use service::{ImageService, ServedImage};

/// Errors that can occur while serving an image.
#[derive(Debug, Error)]
pub enum ImageError {
	/// Path is outside the root, inside the cache, or has no file.
	#[error("Image not found: {0}")]
	NotFound(String),
	/// A recognized option has a malformed or unsupported value.
	#[error("Invalid image options: {0}")]
	BadRequest(String),
	/// The source file exists but is not an image the engine can read.
	#[error("Unreadable image: {0}")]
	Unreadable(String),
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Result of a transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedImage {
	pub bytes: Bytes,
	pub format: ImageFormat,
}

/// External image-processing engine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageEngine: Send + Sync {
	/// Produces the output image for `source` under `options`.
	async fn transform(
		&self,
		source: Bytes,
		options: &ImageOptions,
	) -> Result<TransformedImage, ImageError>;
}

pub type ImageEngineFactory = fn(&toml::Value) -> Result<Box<dyn ImageEngine>, ImageError>;

pub trait ImageEngineRegistry: ImplementationRegistry<Factory = ImageEngineFactory> {}

/// All image engine implementations as (name, factory) pairs.
pub fn get_all_implementations() -> Vec<(&'static str, ImageEngineFactory)> {
	use implementations::passthrough;

	vec![(passthrough::Registry::NAME, passthrough::Registry::factory())]
}
