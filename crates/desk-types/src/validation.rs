//! Client-side form validation.
//!
//! Validation runs before any request is built. Failures are collected per
//! field so the caller can show each message next to the offending input;
//! a form with errors never reaches the backend.

use chrono::NaiveDate;
use std::fmt;
use thiserror::Error;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
	pub field: String,
	pub message: String,
}

/// Collected validation failures of one form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
pub struct FormErrors {
	errors: Vec<FieldError>,
}

impl fmt::Display for FormErrors {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let joined = self
			.errors
			.iter()
			.map(|e| format!("{}: {}", e.field, e.message))
			.collect::<Vec<_>>()
			.join("; ");
		write!(f, "Invalid form: {}", joined)
	}
}

impl FormErrors {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records an error for a field.
	pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
		self.errors.push(FieldError {
			field: field.into(),
			message: message.into(),
		});
	}

	pub fn is_empty(&self) -> bool {
		self.errors.is_empty()
	}

	pub fn len(&self) -> usize {
		self.errors.len()
	}

	/// First message recorded for a field, if any.
	pub fn message_for(&self, field: &str) -> Option<&str> {
		self.errors
			.iter()
			.find(|e| e.field == field)
			.map(|e| e.message.as_str())
	}

	pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
		self.errors.iter()
	}

	/// Adds every error of `other`, prefixing field names with `prefix.`.
	pub fn merge_prefixed(&mut self, prefix: &str, other: FormErrors) {
		for error in other.errors {
			self.add(format!("{}.{}", prefix, error.field), error.message);
		}
	}

	/// Converts the collection into a result.
	pub fn into_result(self) -> Result<(), FormErrors> {
		if self.is_empty() {
			Ok(())
		} else {
			Err(self)
		}
	}
}

/// Records an error when a required text input is blank.
pub fn require_text(errors: &mut FormErrors, field: &str, value: Option<&str>) {
	if value.map(str::trim).is_none_or(str::is_empty) {
		errors.add(field, "Este campo es obligatorio");
	}
}

/// Records an error when a required list is empty.
pub fn require_selection<T>(errors: &mut FormErrors, field: &str, values: &[T]) {
	if values.is_empty() {
		errors.add(field, "Selecciona al menos un elemento");
	}
}

/// Records an error when the end of a date range precedes its start.
///
/// Open ranges (either bound missing) are accepted.
pub fn check_date_range(
	errors: &mut FormErrors,
	field: &str,
	from: Option<NaiveDate>,
	to: Option<NaiveDate>,
) {
	if let (Some(from), Some(to)) = (from, to) {
		if to < from {
			errors.add(
				field,
				"La fecha final no puede ser anterior a la fecha inicial",
			);
		}
	}
}

/// Records an error when an email address is obviously malformed.
pub fn check_email(errors: &mut FormErrors, field: &str, value: &str) {
	let value = value.trim();
	let valid = value
		.split_once('@')
		.is_some_and(|(user, domain)| !user.is_empty() && domain.contains('.'));
	if !valid {
		errors.add(field, "Correo electrónico inválido");
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_required_text() {
		let mut errors = FormErrors::new();
		require_text(&mut errors, "name", Some("  "));
		require_text(&mut errors, "folio", None);
		require_text(&mut errors, "city", Some("Monterrey"));

		assert_eq!(errors.len(), 2);
		assert!(errors.message_for("name").is_some());
		assert!(errors.message_for("city").is_none());
	}

	#[test]
	fn test_date_range_inversion() {
		let jan = NaiveDate::from_ymd_opt(2026, 1, 1);
		let feb = NaiveDate::from_ymd_opt(2026, 2, 1);

		let mut errors = FormErrors::new();
		check_date_range(&mut errors, "dates", jan, feb);
		check_date_range(&mut errors, "open", None, jan);
		assert!(errors.is_empty());

		check_date_range(&mut errors, "dates", feb, jan);
		assert_eq!(errors.len(), 1);
		assert!(errors.into_result().is_err());
	}

	#[test]
	fn test_email_check() {
		let mut errors = FormErrors::new();
		check_email(&mut errors, "email", "ana@example.com");
		assert!(errors.is_empty());
		check_email(&mut errors, "email", "ana@localhost");
		check_email(&mut errors, "email", "@example.com");
		assert_eq!(errors.len(), 2);
	}

	#[test]
	fn test_merge_prefixed_and_display() {
		let mut inner = FormErrors::new();
		inner.add("label", "vacío");
		let mut outer = FormErrors::new();
		outer.merge_prefixed("fields[0]", inner);

		assert_eq!(outer.message_for("fields[0].label"), Some("vacío"));
		assert_eq!(outer.to_string(), "Invalid form: fields[0].label: vacío");
	}
}
