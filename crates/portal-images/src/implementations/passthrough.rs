//! Engine that serves source images unchanged.
//!
//! Resizing options are accepted and ignored. A request for an output
//! format different from the source is rejected, since the bytes would not
//! match the advertised content type.

use crate::{
	ImageEngine, ImageEngineFactory, ImageEngineRegistry, ImageError, ImageFormat, ImageOptions,
	TransformedImage,
};
use async_trait::async_trait;
use bytes::Bytes;
use portal_types::{ConfigSchema, ImplementationRegistry, Schema, ValidationError};

pub struct PassthroughEngine;

#[async_trait]
impl ImageEngine for PassthroughEngine {
	async fn transform(
		&self,
		source: Bytes,
		options: &ImageOptions,
	) -> Result<TransformedImage, ImageError> {
		let format = ImageFormat::sniff(&source)
			.ok_or_else(|| ImageError::Unreadable("unrecognized image signature".into()))?;

		if let Some(requested) = options.output_format() {
			if requested != format {
				return Err(ImageError::BadRequest(format!(
					"cannot convert {} to {}",
					format.content_type(),
					requested.content_type()
				)));
			}
		}

		Ok(TransformedImage {
			bytes: source,
			format,
		})
	}
}

pub struct PassthroughSchema;

impl ConfigSchema for PassthroughSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).validate(config)
	}
}

pub fn create_engine(config: &toml::Value) -> Result<Box<dyn ImageEngine>, ImageError> {
	PassthroughSchema
		.validate(config)
		.map_err(|e| ImageError::Configuration(e.to_string()))?;
	Ok(Box::new(PassthroughEngine))
}

pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "passthrough";
	type Factory = ImageEngineFactory;

	fn factory() -> Self::Factory {
		create_engine
	}
}

impl ImageEngineRegistry for Registry {}
