//! REST envelope types.
//!
//! Every backend response uses the same envelope:
//! `{ "ok": bool, "data": T | null, "message": string }`.

use serde::{Deserialize, Serialize};

/// Uniform response envelope of the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
	pub ok: bool,
	pub data: Option<T>,
	#[serde(default)]
	pub message: String,
}

impl<T> ApiEnvelope<T> {
	pub fn success(data: T) -> Self {
		Self {
			ok: true,
			data: Some(data),
			message: String::new(),
		}
	}

	pub fn failure(message: impl Into<String>) -> Self {
		Self {
			ok: false,
			data: None,
			message: message.into(),
		}
	}
}

/// Body of a non-2xx response.
///
/// Both fields are optional; `details` wins over `message` when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
	#[serde(default)]
	pub details: Option<String>,
	#[serde(default)]
	pub message: Option<String>,
}

impl ApiErrorBody {
	/// Message to surface for a failed response with the given status code.
	pub fn describe(&self, status: u16) -> String {
		self.details
			.as_deref()
			.or(self.message.as_deref())
			.filter(|text| !text.trim().is_empty())
			.map(str::to_string)
			.unwrap_or_else(|| format!("Error {}", status))
	}
}
