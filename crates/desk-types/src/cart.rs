//! Items held by the quote cart.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fee schedule applied to a quote cart.
///
/// `total = base_fee + max(products - included_products, 0) * extra_product_fee
/// + sum(question prices > 0)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRules {
	#[serde(default = "default_base_fee")]
	pub base_fee: Decimal,
	#[serde(default = "default_extra_product_fee")]
	pub extra_product_fee: Decimal,
	#[serde(default = "default_included_products")]
	pub included_products: usize,
}

fn default_base_fee() -> Decimal {
	Decimal::from(45)
}

fn default_extra_product_fee() -> Decimal {
	Decimal::from(15)
}

fn default_included_products() -> usize {
	3
}

impl Default for PricingRules {
	fn default() -> Self {
		Self {
			base_fee: default_base_fee(),
			extra_product_fee: default_extra_product_fee(),
			included_products: default_included_products(),
		}
	}
}

/// A checklist question attached to a selected product.
///
/// Prices are expected to be non-negative; the cart only counts positive
/// prices and does not reject anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionItem {
	pub id: String,
	pub text: String,
	pub price: Decimal,
}

impl QuestionItem {
	pub fn new(id: impl Into<String>, text: impl Into<String>, price: Decimal) -> Self {
		Self {
			id: id.into(),
			text: text.into(),
			price,
		}
	}
}

/// A product selected for a not-yet-submitted service request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedProduct {
	pub id: String,
	pub name: String,
	/// Image references in display order.
	#[serde(default)]
	pub images: Vec<String>,
	/// Checklist questions in display order.
	#[serde(default)]
	pub questions: Vec<QuestionItem>,
}

impl SelectedProduct {
	pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			name: name.into(),
			images: Vec::new(),
			questions: Vec::new(),
		}
	}

	/// Adds a question to the product.
	pub fn with_question(mut self, question: QuestionItem) -> Self {
		self.questions.push(question);
		self
	}

	/// Adds an image reference to the product.
	pub fn with_image(mut self, image: impl Into<String>) -> Self {
		self.images.push(image.into());
		self
	}

	/// Sum of all strictly positive question prices.
	pub fn priced_questions_total(&self) -> Decimal {
		self.questions
			.iter()
			.map(|q| q.price)
			.filter(|price| *price > Decimal::ZERO)
			.sum()
	}
}
