//! Caller identities and the capabilities checked against them.

use crate::Order;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
	/// Stable user identifier.
	pub id: String,
	/// Role names used by role-based policies.
	#[serde(default)]
	pub roles: Vec<String>,
}

impl Identity {
	pub fn new(id: impl Into<String>, roles: Vec<String>) -> Self {
		Self {
			id: id.into(),
			roles,
		}
	}
}

/// A named permission checked by the policy engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(String);

impl Capability {
	/// Access to the eligibility pages.
	pub const VIEW_ELIGIBILITY: &'static str = "view-eligibility";
	/// Access to the team pages.
	pub const VIEW_TEAM: &'static str = "view-team";
	/// Read access to every order regardless of ownership.
	pub const VIEW_ORDERS: &'static str = "view-orders";
	/// Entity-scoped read access.
	pub const VIEW: &'static str = "view";

	pub fn new(name: impl Into<String>) -> Self {
		Self(name.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for Capability {
	fn from(name: &str) -> Self {
		Self::new(name)
	}
}

impl fmt::Display for Capability {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// The entity an entity-scoped capability is checked against.
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
	Order(&'a Order),
}

/// Access rule applied before the image delegate runs. Has no default;
/// every deployment states it in configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageAccess {
	/// No check at all.
	Public,
	/// Any authenticated caller.
	Authenticated,
	/// Authenticated caller holding the named capability.
	Capability(Capability),
}

impl FromStr for ImageAccess {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"public" => Ok(Self::Public),
			"authenticated" => Ok(Self::Authenticated),
			other => match other.strip_prefix("capability:") {
				Some(name) if !name.is_empty() => Ok(Self::Capability(Capability::new(name))),
				_ => Err(format!(
					"invalid image access '{}': expected \"public\", \"authenticated\" or \"capability:<name>\"",
					other
				)),
			},
		}
	}
}

impl fmt::Display for ImageAccess {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Public => f.write_str("public"),
			Self::Authenticated => f.write_str("authenticated"),
			Self::Capability(c) => write!(f, "capability:{}", c),
		}
	}
}

impl Serialize for ImageAccess {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for ImageAccess {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_image_access_parsing() {
		assert_eq!("public".parse::<ImageAccess>().unwrap(), ImageAccess::Public);
		assert_eq!(
			"authenticated".parse::<ImageAccess>().unwrap(),
			ImageAccess::Authenticated
		);
		assert_eq!(
			"capability:view-images".parse::<ImageAccess>().unwrap(),
			ImageAccess::Capability(Capability::new("view-images"))
		);
		assert!("capability:".parse::<ImageAccess>().is_err());
		assert!("everyone".parse::<ImageAccess>().is_err());
	}

	#[test]
	fn test_image_access_serde() {
		#[derive(Deserialize, Serialize)]
		struct Wrapper {
			access: ImageAccess,
		}

		let parsed: Wrapper = toml::from_str("access = \"capability:x\"").unwrap();
		assert_eq!(parsed.access, ImageAccess::Capability("x".into()));
		assert_eq!(
			toml::to_string(&parsed).unwrap().trim(),
			"access = \"capability:x\""
		);
	}
}
