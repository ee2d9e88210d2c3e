//! Customer pages. Customers have no data source yet, so both views carry
//! explicit placeholders.

use portal_types::{Collection, CustomersIndexProps, CustomersShowProps, Record, View};

pub fn index() -> View {
	View::CustomersIndex(CustomersIndexProps {
		customers: Collection::Unimplemented,
	})
}

pub fn show(id: &str) -> View {
	tracing::debug!(customer = %id, "Customer detail has no data source");
	View::CustomersShow(CustomersShowProps {
		customer: Record::Unimplemented,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_placeholders() {
		let view = index();
		assert_eq!(view.component(), "Customers/Index");
		assert_eq!(view.props(), serde_json::json!({ "customers": [] }));
		assert!(view.is_placeholder());

		let view = show("5");
		assert_eq!(view.component(), "Customers/Show");
		assert_eq!(view.props(), serde_json::json!({ "customer": null }));
		assert!(view.is_placeholder());
	}
}
