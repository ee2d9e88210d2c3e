//! Path scoping and the on-disk cache in front of an [`ImageEngine`].

use crate::{ImageEngine, ImageError, ImageFormat, ImageOptions};
use bytes::Bytes;
use sha3::{Digest, Sha3_256};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// An image ready to be written to a response.
#[derive(Debug, Clone)]
pub struct ServedImage {
	pub bytes: Bytes,
	pub format: ImageFormat,
	/// Seconds clients may cache the response for.
	pub max_age: u64,
}

impl ServedImage {
	pub fn content_type(&self) -> &'static str {
		self.format.content_type()
	}
}

pub struct ImageService {
	source_root: PathBuf,
	cache_prefix: String,
	engine: Box<dyn ImageEngine>,
	max_age: u64,
}

impl ImageService {
	pub fn new(
		source_root: PathBuf,
		cache_prefix: impl Into<String>,
		engine: Box<dyn ImageEngine>,
		max_age: u64,
	) -> Self {
		Self {
			source_root,
			cache_prefix: cache_prefix.into(),
			engine,
			max_age,
		}
	}

	pub fn cache_root(&self) -> PathBuf {
		self.source_root.join(&self.cache_prefix)
	}

	/// Serves `path` (relative to the source root) under `options`.
	pub async fn serve(
		&self,
		path: &str,
		options: &ImageOptions,
	) -> Result<ServedImage, ImageError> {
		let relative = self.scoped_path(path)?;
		let source_path = self.resolve_source(&relative).await?;
		let cache_path = self.cache_path(&relative, options);

		match fs::read(&cache_path).await {
			Ok(cached) => {
				tracing::debug!(path = %relative.display(), "Image cache hit");
				let format = ImageFormat::sniff(&cached)
					.or_else(|| options.output_format())
					.or_else(|| ImageFormat::from_path(&relative))
					.ok_or_else(|| ImageError::Unreadable(relative.display().to_string()))?;
				return Ok(self.served(Bytes::from(cached), format));
			},
			Err(e) if is_missing(e.kind()) => {},
			Err(e) => return Err(e.into()),
		}

		tracing::debug!(path = %relative.display(), "Image cache miss");
		let source = fs::read(&source_path)
			.await
			.map_err(|e| source_error(e, &relative))?;
		let transformed = self.engine.transform(Bytes::from(source), options).await?;

		if let Err(e) = write_atomic(&cache_path, &transformed.bytes).await {
			tracing::warn!(
				path = %cache_path.display(),
				error = %e,
				"Failed to write image cache entry"
			);
		}

		Ok(self.served(transformed.bytes, transformed.format))
	}

	fn served(&self, bytes: Bytes, format: ImageFormat) -> ServedImage {
		ServedImage {
			bytes,
			format,
			max_age: self.max_age,
		}
	}

	/// Validates a request path and returns it as a relative path.
	///
	/// Only plain segments are accepted, and the first segment may not be
	/// the cache prefix.
	fn scoped_path(&self, path: &str) -> Result<PathBuf, ImageError> {
		let not_found = || ImageError::NotFound(path.to_string());
		let candidate = Path::new(path);

		let mut relative = PathBuf::new();
		for component in candidate.components() {
			match component {
				Component::Normal(segment) => relative.push(segment),
				_ => return Err(not_found()),
			}
		}

		match relative.components().next() {
			None => Err(not_found()),
			Some(Component::Normal(first)) if first == self.cache_prefix.as_str() => {
				Err(not_found())
			},
			Some(_) => Ok(relative),
		}
	}

	/// Resolves the source file, following symlinks, and checks that it
	/// still lies inside the root and outside the cache.
	async fn resolve_source(&self, relative: &Path) -> Result<PathBuf, ImageError> {
		let not_found = || ImageError::NotFound(relative.display().to_string());

		let root = fs::canonicalize(&self.source_root)
			.await
			.map_err(|e| source_error(e, relative))?;
		let resolved = fs::canonicalize(root.join(relative))
			.await
			.map_err(|e| source_error(e, relative))?;

		if !resolved.starts_with(&root) || resolved.starts_with(root.join(&self.cache_prefix)) {
			tracing::warn!(path = %relative.display(), "Image path resolves outside the source root");
			return Err(not_found());
		}
		let metadata = fs::metadata(&resolved)
			.await
			.map_err(|e| source_error(e, relative))?;
		if !metadata.is_file() {
			return Err(not_found());
		}

		Ok(resolved)
	}

	/// `<root>/<prefix>/<path>/<sha3-256 of "path?options">`.
	fn cache_path(&self, relative: &Path, options: &ImageOptions) -> PathBuf {
		let signature = format!("{}?{}", relative.to_string_lossy(), options.canonical());
		let digest = Sha3_256::digest(signature.as_bytes());
		self.cache_root().join(relative).join(hex::encode(digest))
	}
}

/// Kinds the filesystem reports for a path that names no file, such as a
/// segment below a regular file or an overlong name.
fn is_missing(kind: ErrorKind) -> bool {
	matches!(
		kind,
		ErrorKind::NotFound | ErrorKind::NotADirectory | ErrorKind::InvalidFilename
	)
}

fn source_error(err: std::io::Error, relative: &Path) -> ImageError {
	match err.kind() {
		kind if is_missing(kind) => ImageError::NotFound(relative.display().to_string()),
		ErrorKind::PermissionDenied => ImageError::Unreadable(relative.display().to_string()),
		_ => ImageError::Io(err),
	}
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent).await?;
	}
	let suffix = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
	let temp_path = path.with_extension(format!("tmp-{}-{}", std::process::id(), suffix));
	fs::write(&temp_path, bytes).await?;
	if let Err(e) = fs::rename(&temp_path, path).await {
		let _ = fs::remove_file(&temp_path).await;
		return Err(e);
	}
	Ok(())
}
