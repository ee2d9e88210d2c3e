//! Client-rendered views and their payloads.
//!
//! Every page the backend can mount is a variant of [`View`], and each
//! variant carries its own props type, so an unknown component name or a
//! payload of the wrong shape does not compile. A view serializes as
//! `{"component": "...", "props": {...}}`.
//!
//! Endpoints whose data source does not exist yet return
//! [`Collection::Unimplemented`] or [`Record::Unimplemented`]. These serialize
//! exactly like an empty list or a null record, but stay distinguishable from
//! a genuinely empty result in code and through [`View::is_placeholder`].

use crate::OrderSummary;
use serde::{Serialize, Serializer};

/// A list payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collection<T> {
	/// No data source backs this list yet.
	Unimplemented,
	Loaded(Vec<T>),
}

impl<T> Collection<T> {
	pub fn is_unimplemented(&self) -> bool {
		matches!(self, Collection::Unimplemented)
	}
}

impl<T: Serialize> Serialize for Collection<T> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			Collection::Unimplemented => serializer.collect_seq(std::iter::empty::<&T>()),
			Collection::Loaded(items) => items.serialize(serializer),
		}
	}
}

/// A single-item payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record<T> {
	/// No data source backs this record yet.
	Unimplemented,
	Loaded(T),
}

impl<T> Record<T> {
	pub fn is_unimplemented(&self) -> bool {
		matches!(self, Record::Unimplemented)
	}
}

impl<T: Serialize> Serialize for Record<T> {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			Record::Unimplemented => serializer.serialize_none(),
			Record::Loaded(item) => serializer.serialize_some(item),
		}
	}
}

/// Customer row. Customers have no data source yet, so this only fixes the
/// shape the list will carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerSummary {
	pub id: String,
	pub name: String,
}

/// Team member row; same situation as [`CustomerSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamMemberSummary {
	pub id: String,
	pub name: String,
}

/// Props for views that mount without initial data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmptyProps {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomersIndexProps {
	pub customers: Collection<CustomerSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomersShowProps {
	pub customer: Record<CustomerSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderReviewProps {
	pub order: OrderSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamIndexProps {
	pub team: Collection<TeamMemberSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamShowProps {
	pub member: Record<TeamMemberSummary>,
}

/// Every view the client application can mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "component", content = "props")]
pub enum View {
	#[serde(rename = "Customers/Index")]
	CustomersIndex(CustomersIndexProps),
	#[serde(rename = "Customers/Show")]
	CustomersShow(CustomersShowProps),
	#[serde(rename = "Eligibility/Index")]
	EligibilityIndex(EmptyProps),
	#[serde(rename = "Order/Index")]
	OrderIndex(EmptyProps),
	#[serde(rename = "Order/CreateOrder")]
	OrderCreate(EmptyProps),
	#[serde(rename = "Order/OrderApproval")]
	OrderApproval(EmptyProps),
	#[serde(rename = "Orders/Review")]
	OrderReview(OrderReviewProps),
	#[serde(rename = "Team/Index")]
	TeamIndex(TeamIndexProps),
	#[serde(rename = "Team/Show")]
	TeamShow(TeamShowProps),
}

impl View {
	/// The component name the client resolves.
	pub fn component(&self) -> &'static str {
		match self {
			View::CustomersIndex(_) => "Customers/Index",
			View::CustomersShow(_) => "Customers/Show",
			View::EligibilityIndex(_) => "Eligibility/Index",
			View::OrderIndex(_) => "Order/Index",
			View::OrderCreate(_) => "Order/CreateOrder",
			View::OrderApproval(_) => "Order/OrderApproval",
			View::OrderReview(_) => "Orders/Review",
			View::TeamIndex(_) => "Team/Index",
			View::TeamShow(_) => "Team/Show",
		}
	}

	/// The props as a JSON object.
	pub fn props(&self) -> serde_json::Value {
		let value = match self {
			View::CustomersIndex(p) => serde_json::to_value(p),
			View::CustomersShow(p) => serde_json::to_value(p),
			View::EligibilityIndex(p)
			| View::OrderIndex(p)
			| View::OrderCreate(p)
			| View::OrderApproval(p) => serde_json::to_value(p),
			View::OrderReview(p) => serde_json::to_value(p),
			View::TeamIndex(p) => serde_json::to_value(p),
			View::TeamShow(p) => serde_json::to_value(p),
		};
		// Props are plain structs of strings and lists; serializing them cannot fail.
		value.unwrap_or_else(|_| serde_json::Value::Object(Default::default()))
	}

	/// True when the payload is a not-yet-implemented placeholder.
	pub fn is_placeholder(&self) -> bool {
		match self {
			View::CustomersIndex(p) => p.customers.is_unimplemented(),
			View::CustomersShow(p) => p.customer.is_unimplemented(),
			View::TeamIndex(p) => p.team.is_unimplemented(),
			View::TeamShow(p) => p.member.is_unimplemented(),
			_ => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_view_serializes_component_and_props() {
		let view = View::CustomersIndex(CustomersIndexProps {
			customers: Collection::Unimplemented,
		});
		assert_eq!(
			serde_json::to_value(&view).unwrap(),
			json!({"component": "Customers/Index", "props": {"customers": []}})
		);
	}

	#[test]
	fn test_component_matches_serialized_tag() {
		let views = vec![
			View::CustomersIndex(CustomersIndexProps {
				customers: Collection::Unimplemented,
			}),
			View::CustomersShow(CustomersShowProps {
				customer: Record::Unimplemented,
			}),
			View::EligibilityIndex(EmptyProps {}),
			View::OrderIndex(EmptyProps {}),
			View::OrderCreate(EmptyProps {}),
			View::OrderApproval(EmptyProps {}),
			View::OrderReview(OrderReviewProps {
				order: OrderSummary {
					id: "1".into(),
					status: "draft".into(),
				},
			}),
			View::TeamIndex(TeamIndexProps {
				team: Collection::Unimplemented,
			}),
			View::TeamShow(TeamShowProps {
				member: Record::Unimplemented,
			}),
		];

		for view in views {
			let value = serde_json::to_value(&view).unwrap();
			assert_eq!(value["component"], view.component());
			assert_eq!(value["props"], view.props());
			assert!(view.props().is_object());
		}
	}

	#[test]
	fn test_placeholders_serialize_like_empty_data() {
		let show = View::TeamShow(TeamShowProps {
			member: Record::Unimplemented,
		});
		assert_eq!(show.props(), json!({"member": null}));
		assert!(show.is_placeholder());

		let index = View::TeamIndex(TeamIndexProps {
			team: Collection::Loaded(vec![]),
		});
		assert_eq!(index.props(), json!({"team": []}));
		assert!(!index.is_placeholder());
	}

	#[test]
	fn test_loaded_record_serializes_value() {
		let view = View::CustomersShow(CustomersShowProps {
			customer: Record::Loaded(CustomerSummary {
				id: "c1".into(),
				name: "Acme".into(),
			}),
		});
		assert_eq!(
			view.props(),
			json!({"customer": {"id": "c1", "name": "Acme"}})
		);
	}

	#[test]
	fn test_empty_props_is_object() {
		assert_eq!(View::OrderCreate(EmptyProps {}).props(), json!({}));
	}
}
