//! Bearer token held by the console session.
//!
//! The token is zeroed on drop and never shows up in logs or debug output.
//! Serialization keeps the real value because the session store persists it;
//! only formatting is redacted.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroizing;

const REDACTED: &str = "***REDACTED***";

/// An authentication token issued by the backend.
#[derive(Clone)]
pub struct AuthToken(Zeroizing<String>);

impl AuthToken {
	pub fn new(token: impl Into<String>) -> Self {
		Self(Zeroizing::new(token.into()))
	}

	/// Exposes the raw token.
	///
	/// Only the HTTP layer should need this, to build the header value.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Value of the `Authorization` header for this token.
	pub fn bearer_value(&self) -> Zeroizing<String> {
		Zeroizing::new(format!("Bearer {}", self.0.as_str()))
	}

	pub fn is_empty(&self) -> bool {
		self.0.trim().is_empty()
	}
}

impl fmt::Debug for AuthToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "AuthToken({})", REDACTED)
	}
}

impl fmt::Display for AuthToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl From<String> for AuthToken {
	fn from(s: String) -> Self {
		Self::new(s)
	}
}

impl From<&str> for AuthToken {
	fn from(s: &str) -> Self {
		Self::new(s)
	}
}

impl PartialEq for AuthToken {
	fn eq(&self, other: &Self) -> bool {
		self.0.as_str() == other.0.as_str()
	}
}

impl Eq for AuthToken {}

impl Serialize for AuthToken {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.0)
	}
}

impl<'de> Deserialize<'de> for AuthToken {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		Ok(AuthToken::new(s))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_token_is_redacted_in_output() {
		let token = AuthToken::from("eyJhbGciOi.payload.sig");
		assert_eq!(format!("{:?}", token), "AuthToken(***REDACTED***)");
		assert_eq!(format!("{}", token), "***REDACTED***");
	}

	#[test]
	fn test_bearer_value() {
		let token = AuthToken::from("abc123");
		assert_eq!(token.bearer_value().as_str(), "Bearer abc123");
		assert_eq!(token.expose(), "abc123");
	}

	#[test]
	fn test_serialization_keeps_value_for_persistence() {
		let token = AuthToken::from("abc123");
		let json = serde_json::to_string(&token).unwrap();
		assert_eq!(json, "\"abc123\"");
		let back: AuthToken = serde_json::from_str(&json).unwrap();
		assert_eq!(back, token);
	}

	#[test]
	fn test_blank_token_is_empty() {
		assert!(AuthToken::from("  ").is_empty());
		assert!(!AuthToken::from("x").is_empty());
	}
}
