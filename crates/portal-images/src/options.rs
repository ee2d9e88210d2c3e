//! Query-string options for image requests.

use crate::{ImageError, ImageFormat};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

pub const MAX_DIMENSION: u32 = 8192;
pub const MAX_DPR: u8 = 8;

/// How the output is fitted into `w` x `h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
	Contain,
	Max,
	Fill,
	Stretch,
	Crop,
}

impl Fit {
	pub fn as_str(&self) -> &'static str {
		match self {
			Fit::Contain => "contain",
			Fit::Max => "max",
			Fit::Fill => "fill",
			Fit::Stretch => "stretch",
			Fit::Crop => "crop",
		}
	}
}

impl FromStr for Fit {
	type Err = ImageError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"contain" => Ok(Fit::Contain),
			"max" => Ok(Fit::Max),
			"fill" => Ok(Fit::Fill),
			"stretch" => Ok(Fit::Stretch),
			"crop" => Ok(Fit::Crop),
			other => Err(ImageError::BadRequest(format!("unsupported fit '{}'", other))),
		}
	}
}

impl fmt::Display for Fit {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Parsed image options.
///
/// Unrecognized keys are kept in `extra` for engines that understand them,
/// but they never affect validation or the cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageOptions {
	pub width: Option<u32>,
	pub height: Option<u32>,
	pub fit: Option<Fit>,
	/// Raw `fm` value, kept so `jpg` and `pjpg` cache separately.
	pub format: Option<String>,
	pub quality: Option<u8>,
	pub dpr: Option<u8>,
	pub extra: BTreeMap<String, String>,
}

impl ImageOptions {
	pub fn parse(query: &HashMap<String, String>) -> Result<Self, ImageError> {
		let mut options = ImageOptions::default();

		for (key, value) in query {
			match key.as_str() {
				"w" => options.width = Some(parse_dimension(key, value)?),
				"h" => options.height = Some(parse_dimension(key, value)?),
				"fit" => options.fit = Some(value.parse()?),
				"fm" => {
					if ImageFormat::from_option(value).is_none() {
						return Err(ImageError::BadRequest(format!(
							"unsupported format '{}'",
							value
						)));
					}
					options.format = Some(value.clone());
				},
				"q" => options.quality = Some(parse_bounded(key, value, 0, 100)?),
				"dpr" => options.dpr = Some(parse_bounded(key, value, 1, MAX_DPR)?),
				_ => {
					options.extra.insert(key.clone(), value.clone());
				},
			}
		}

		Ok(options)
	}

	/// Requested output format, if any.
	pub fn output_format(&self) -> Option<ImageFormat> {
		self.format.as_deref().and_then(ImageFormat::from_option)
	}

	/// Recognized options as sorted `key=value` pairs.
	pub fn canonical(&self) -> String {
		let mut pairs: Vec<(&str, String)> = Vec::new();
		if let Some(dpr) = self.dpr {
			pairs.push(("dpr", dpr.to_string()));
		}
		if let Some(fit) = self.fit {
			pairs.push(("fit", fit.to_string()));
		}
		if let Some(format) = &self.format {
			pairs.push(("fm", format.clone()));
		}
		if let Some(height) = self.height {
			pairs.push(("h", height.to_string()));
		}
		if let Some(quality) = self.quality {
			pairs.push(("q", quality.to_string()));
		}
		if let Some(width) = self.width {
			pairs.push(("w", width.to_string()));
		}
		pairs
			.into_iter()
			.map(|(key, value)| format!("{}={}", key, value))
			.collect::<Vec<_>>()
			.join("&")
	}
}

fn parse_dimension(key: &str, value: &str) -> Result<u32, ImageError> {
	let parsed: u32 = value
		.parse()
		.map_err(|_| ImageError::BadRequest(format!("'{}' must be a positive integer", key)))?;
	if parsed == 0 || parsed > MAX_DIMENSION {
		return Err(ImageError::BadRequest(format!(
			"'{}' must be between 1 and {}",
			key, MAX_DIMENSION
		)));
	}
	Ok(parsed)
}

fn parse_bounded(key: &str, value: &str, min: u8, max: u8) -> Result<u8, ImageError> {
	value
		.parse::<u8>()
		.ok()
		.filter(|v| (min..=max).contains(v))
		.ok_or_else(|| {
			ImageError::BadRequest(format!("'{}' must be between {} and {}", key, min, max))
		})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	#[test]
	fn test_parse_known_options() {
		let options = ImageOptions::parse(&query(&[
			("w", "300"),
			("h", "200"),
			("fit", "crop"),
			("fm", "webp"),
			("q", "80"),
			("dpr", "2"),
		]))
		.unwrap();

		assert_eq!(options.width, Some(300));
		assert_eq!(options.height, Some(200));
		assert_eq!(options.fit, Some(Fit::Crop));
		assert_eq!(options.output_format(), Some(ImageFormat::Webp));
		assert_eq!(options.quality, Some(80));
		assert_eq!(options.dpr, Some(2));
		assert_eq!(options.canonical(), "dpr=2&fit=crop&fm=webp&h=200&q=80&w=300");
	}

	#[test]
	fn test_malformed_values_are_bad_requests() {
		for (key, value) in [
			("w", "abc"),
			("w", "0"),
			("w", "9000"),
			("h", "-1"),
			("fit", "cover"),
			("fm", "bmp"),
			("q", "101"),
			("dpr", "0"),
			("dpr", "9"),
		] {
			assert!(
				matches!(
					ImageOptions::parse(&query(&[(key, value)])),
					Err(ImageError::BadRequest(_))
				),
				"{}={} should be rejected",
				key,
				value
			);
		}
	}

	#[test]
	fn test_unknown_keys_are_kept_but_not_keyed() {
		let options = ImageOptions::parse(&query(&[("blur", "5"), ("w", "10")])).unwrap();
		assert_eq!(options.extra.get("blur").map(String::as_str), Some("5"));
		assert_eq!(options.canonical(), "w=10");
	}

	#[test]
	fn test_empty_query() {
		let options = ImageOptions::parse(&HashMap::new()).unwrap();
		assert_eq!(options, ImageOptions::default());
		assert_eq!(options.canonical(), "");
	}
}
