//! Storage-related types for the desk.

use std::str::FromStr;

/// Storage namespaces for persisted console state.
///
/// Only session data survives a restart; carts and filters stay in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// Key for the authentication token and signed-in user
	Session,
}

impl StorageKey {
	/// Returns the string representation of the storage key.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Session => "session",
		}
	}

	/// Returns an iterator over all StorageKey variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[Self::Session].into_iter()
	}
}

impl FromStr for StorageKey {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"session" => Ok(Self::Session),
			_ => Err(()),
		}
	}
}
