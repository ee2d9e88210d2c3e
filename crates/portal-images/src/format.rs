//! Image formats the delegate knows how to label.

use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
	Jpeg,
	Png,
	Gif,
	Webp,
}

impl ImageFormat {
	pub fn content_type(&self) -> &'static str {
		match self {
			ImageFormat::Jpeg => "image/jpeg",
			ImageFormat::Png => "image/png",
			ImageFormat::Gif => "image/gif",
			ImageFormat::Webp => "image/webp",
		}
	}

	/// Parses the value of the `fm` option. `pjpg` (progressive JPEG) is
	/// still JPEG on the wire.
	pub fn from_option(value: &str) -> Option<Self> {
		match value {
			"jpg" | "pjpg" => Some(ImageFormat::Jpeg),
			"png" => Some(ImageFormat::Png),
			"gif" => Some(ImageFormat::Gif),
			"webp" => Some(ImageFormat::Webp),
			_ => None,
		}
	}

	pub fn from_path(path: &Path) -> Option<Self> {
		let extension = path.extension()?.to_str()?.to_ascii_lowercase();
		match extension.as_str() {
			"jpg" | "jpeg" => Some(ImageFormat::Jpeg),
			"png" => Some(ImageFormat::Png),
			"gif" => Some(ImageFormat::Gif),
			"webp" => Some(ImageFormat::Webp),
			_ => None,
		}
	}

	/// Detects the format from the file signature.
	pub fn sniff(bytes: &[u8]) -> Option<Self> {
		match bytes {
			[0xFF, 0xD8, 0xFF, ..] => Some(ImageFormat::Jpeg),
			[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(ImageFormat::Png),
			[b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some(ImageFormat::Gif),
			[b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => {
				Some(ImageFormat::Webp)
			},
			_ => None,
		}
	}
}
