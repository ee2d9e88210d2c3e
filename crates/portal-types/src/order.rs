//! Order entity as seen by the portal.
//!
//! Orders are owned by the data-access layer; the portal only reads them and
//! projects the display fields a page needs.

use serde::{Deserialize, Serialize};

/// Status shown for orders that do not carry one.
pub const DEFAULT_ORDER_STATUS: &str = "draft";

/// An order record as stored by the data-access layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
	pub id: String,
	/// Workflow status. Absent on orders that were never submitted.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<String>,
	/// Identifier of the user who created the order.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub owner_id: Option<String>,
}

/// Display projection of an order for the review page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
	pub id: String,
	pub status: String,
}

impl From<&Order> for OrderSummary {
	fn from(order: &Order) -> Self {
		Self {
			id: order.id.clone(),
			status: order
				.status
				.clone()
				.unwrap_or_else(|| DEFAULT_ORDER_STATUS.to_string()),
		}
	}
}
