//! Product-builder field kinds.
//!
//! A product template is a list of fields the field auditor fills in at a
//! visit. Each kind carries only the attributes that apply to it.

use crate::validation::{require_text, FormErrors};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single field of a product template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
	/// Free text answer.
	Text {
		label: String,
		#[serde(default)]
		required: bool,
		#[serde(default, rename = "maxLength", skip_serializing_if = "Option::is_none")]
		max_length: Option<u32>,
	},
	/// Numeric reading, optionally bounded.
	Number {
		label: String,
		#[serde(default)]
		required: bool,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		min: Option<Decimal>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		max: Option<Decimal>,
		#[serde(default, skip_serializing_if = "Option::is_none")]
		unit: Option<String>,
	},
	/// Calendar date.
	Date {
		label: String,
		#[serde(default)]
		required: bool,
	},
	/// Rating on a fixed scale of named grades.
	Quality {
		label: String,
		#[serde(default)]
		required: bool,
		grades: Vec<String>,
	},
}

impl FieldKind {
	pub fn label(&self) -> &str {
		match self {
			FieldKind::Text { label, .. }
			| FieldKind::Number { label, .. }
			| FieldKind::Date { label, .. }
			| FieldKind::Quality { label, .. } => label,
		}
	}

	pub fn is_required(&self) -> bool {
		match self {
			FieldKind::Text { required, .. }
			| FieldKind::Number { required, .. }
			| FieldKind::Date { required, .. }
			| FieldKind::Quality { required, .. } => *required,
		}
	}

	/// Name of the kind as used on the wire.
	pub fn kind_name(&self) -> &'static str {
		match self {
			FieldKind::Text { .. } => "text",
			FieldKind::Number { .. } => "number",
			FieldKind::Date { .. } => "date",
			FieldKind::Quality { .. } => "quality",
		}
	}

	/// Checks the attributes specific to this kind.
	pub fn validate(&self) -> Result<(), FormErrors> {
		let mut errors = FormErrors::new();
		require_text(&mut errors, "label", Some(self.label()));

		match self {
			FieldKind::Text { max_length, .. } => {
				if *max_length == Some(0) {
					errors.add("maxLength", "La longitud máxima debe ser mayor a cero");
				}
			}
			FieldKind::Number { min, max, .. } => {
				if let (Some(min), Some(max)) = (min, max) {
					if max < min {
						errors.add("max", "El máximo no puede ser menor al mínimo");
					}
				}
			}
			FieldKind::Date { .. } => {}
			FieldKind::Quality { grades, .. } => {
				if grades.len() < 2 {
					errors.add("grades", "Define al menos dos calificaciones");
				}
				let mut seen = HashSet::new();
				if grades
					.iter()
					.any(|grade| grade.trim().is_empty() || !seen.insert(grade.trim()))
				{
					errors.add("grades", "Las calificaciones deben ser únicas y no vacías");
				}
			}
		}

		errors.into_result()
	}
}

/// Validates every field of a template, reporting errors as `fields[i].attr`.
pub fn validate_template(fields: &[FieldKind]) -> Result<(), FormErrors> {
	let mut errors = FormErrors::new();
	if fields.is_empty() {
		errors.add("fields", "El producto necesita al menos un campo");
	}
	for (index, field) in fields.iter().enumerate() {
		if let Err(field_errors) = field.validate() {
			errors.merge_prefixed(&format!("fields[{}]", index), field_errors);
		}
	}
	errors.into_result()
}
