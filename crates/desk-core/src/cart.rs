//! Quote cart aggregation and pricing.
//!
//! A [`QuoteCart`] is an immutable snapshot: every operation returns a new
//! cart and leaves the original untouched. [`CartStore`] holds the current
//! snapshot for a session and swaps it atomically, so readers always see a
//! complete cart.

use arc_swap::ArcSwap;
use desk_types::{
	require_selection, FormErrors, PricingRules, ProductLine, QuotationPayload, SelectedProduct,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Products and establishments chosen for a service request not yet submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteCart {
	products: Vec<SelectedProduct>,
	establishments: Vec<String>,
}

impl QuoteCart {
	pub fn new() -> Self {
		Self::default()
	}

	/// Products in insertion order.
	pub fn products(&self) -> &[SelectedProduct] {
		&self.products
	}

	/// Establishment ids in the order they were selected.
	pub fn establishments(&self) -> &[String] {
		&self.establishments
	}

	pub fn product_count(&self) -> usize {
		self.products.len()
	}

	pub fn is_empty(&self) -> bool {
		self.products.is_empty() && self.establishments.is_empty()
	}

	pub fn contains(&self, product_id: &str) -> bool {
		self.products.iter().any(|p| p.id == product_id)
	}

	/// Appends a product.
	///
	/// Products are not de-duplicated: a second product with an id already in
	/// the cart is appended and priced like any other.
	#[must_use]
	pub fn add_product(&self, product: SelectedProduct) -> Self {
		if self.contains(&product.id) {
			tracing::warn!(product_id = %product.id, "Product already in cart, adding again");
		}
		let mut next = self.clone();
		next.products.push(product);
		next
	}

	/// Removes the first product with the given id. Unknown ids are ignored.
	#[must_use]
	pub fn remove_product(&self, product_id: &str) -> Self {
		let mut next = self.clone();
		if let Some(index) = next.products.iter().position(|p| p.id == product_id) {
			next.products.remove(index);
		}
		next
	}

	/// Replaces the establishment selection wholesale.
	#[must_use]
	pub fn set_establishments(&self, ids: Vec<String>) -> Self {
		Self {
			products: self.products.clone(),
			establishments: ids,
		}
	}

	#[must_use]
	pub fn clear(&self) -> Self {
		Self::default()
	}

	/// Total under the standard fee schedule.
	pub fn calculate_total(&self) -> Decimal {
		self.calculate_total_with(&PricingRules::default())
	}

	/// Total under `rules`: base fee, plus a fee for every product past the
	/// included count, plus every positive question price.
	pub fn calculate_total_with(&self, rules: &PricingRules) -> Decimal {
		let extra_products = self.products.len().saturating_sub(rules.included_products);
		let extra_product_fee = rules.extra_product_fee * Decimal::from(extra_products as u64);
		let question_fee: Decimal = self
			.products
			.iter()
			.map(SelectedProduct::priced_questions_total)
			.sum();

		rules.base_fee + extra_product_fee + question_fee
	}
}

/// Holder of the current cart snapshot for one session.
#[derive(Debug)]
pub struct CartStore {
	current: ArcSwap<QuoteCart>,
	rules: PricingRules,
}

impl CartStore {
	pub fn new(rules: PricingRules) -> Self {
		Self {
			current: ArcSwap::from_pointee(QuoteCart::default()),
			rules,
		}
	}

	/// Current snapshot.
	pub fn snapshot(&self) -> Arc<QuoteCart> {
		self.current.load_full()
	}

	pub fn rules(&self) -> &PricingRules {
		&self.rules
	}

	/// Total of the current snapshot under this store's fee schedule.
	pub fn total(&self) -> Decimal {
		self.current.load().calculate_total_with(&self.rules)
	}

	pub fn add_product(&self, product: SelectedProduct) -> Arc<QuoteCart> {
		self.apply(|cart| cart.add_product(product.clone()))
	}

	pub fn remove_product(&self, product_id: &str) -> Arc<QuoteCart> {
		self.apply(|cart| cart.remove_product(product_id))
	}

	pub fn set_establishments(&self, ids: Vec<String>) -> Arc<QuoteCart> {
		self.apply(|cart| cart.set_establishments(ids.clone()))
	}

	pub fn clear(&self) -> Arc<QuoteCart> {
		self.apply(QuoteCart::clear)
	}

	/// Empties the cart only if it still holds `expected`.
	///
	/// Returns false, leaving the cart untouched, when it changed since
	/// `expected` was taken.
	pub fn clear_if_current(&self, expected: &Arc<QuoteCart>) -> bool {
		let previous = self
			.current
			.compare_and_swap(expected, Arc::new(QuoteCart::default()));
		Arc::ptr_eq(&previous, expected)
	}

	/// Swaps in `f(current)` and returns the snapshot that was stored.
	fn apply<F>(&self, f: F) -> Arc<QuoteCart>
	where
		F: Fn(&QuoteCart) -> QuoteCart,
	{
		let mut stored = None;
		self.current.rcu(|cart| {
			let next = Arc::new(f(cart));
			stored = Some(Arc::clone(&next));
			next
		});
		stored.unwrap_or_else(|| self.current.load_full())
	}
}

impl Default for CartStore {
	fn default() -> Self {
		Self::new(PricingRules::default())
	}
}

/// Extra details attached when a cart is turned into a quotation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartSubmission {
	pub client_id: Option<String>,
	pub notes: Option<String>,
}

impl CartSubmission {
	/// Builds the creation payload for `cart`.
	///
	/// A quotation needs at least one product and one establishment; both are
	/// checked before any request is built.
	pub fn payload(
		&self,
		cart: &QuoteCart,
		rules: &PricingRules,
	) -> Result<QuotationPayload, FormErrors> {
		let mut errors = FormErrors::new();
		require_selection(&mut errors, "products", cart.products());
		require_selection(&mut errors, "establishments", cart.establishments());
		errors.into_result()?;

		Ok(QuotationPayload {
			client_id: self.client_id.clone(),
			establishment_ids: cart.establishments().to_vec(),
			products: cart
				.products()
				.iter()
				.map(|p| ProductLine {
					product_id: p.id.clone(),
					question_ids: p.questions.iter().map(|q| q.id.clone()).collect(),
				})
				.collect(),
			total: cart.calculate_total_with(rules),
			notes: self
				.notes
				.as_deref()
				.map(str::trim)
				.filter(|n| !n.is_empty())
				.map(str::to_string),
		})
	}
}
