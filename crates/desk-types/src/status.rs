//! Record status and caller role.
//!
//! Quotations and services share one closed set of statuses. The role of the
//! signed-in user decides which transitions the console offers for a status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a quotation or service record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
	/// Record has been created and can still be edited or deleted.
	Draft,
	/// Record was submitted for review.
	Pending,
	/// Record was approved and waits to be started.
	Approved,
	/// Work is underway; visit tickets exist.
	InProgress,
	/// Work finished.
	Completed,
	/// Record was withdrawn.
	Cancelled,
}

impl RecordStatus {
	/// All statuses in lifecycle order.
	pub const ALL: [RecordStatus; 6] = [
		RecordStatus::Draft,
		RecordStatus::Pending,
		RecordStatus::Approved,
		RecordStatus::InProgress,
		RecordStatus::Completed,
		RecordStatus::Cancelled,
	];

	/// Returns the wire representation of the status.
	pub fn as_str(&self) -> &'static str {
		match self {
			RecordStatus::Draft => "draft",
			RecordStatus::Pending => "pending",
			RecordStatus::Approved => "approved",
			RecordStatus::InProgress => "in_progress",
			RecordStatus::Completed => "completed",
			RecordStatus::Cancelled => "cancelled",
		}
	}

	/// Label shown to operators.
	pub fn label(&self) -> &'static str {
		match self {
			RecordStatus::Draft => "Borrador",
			RecordStatus::Pending => "Pendiente",
			RecordStatus::Approved => "Aprobada",
			RecordStatus::InProgress => "En progreso",
			RecordStatus::Completed => "Completada",
			RecordStatus::Cancelled => "Cancelada",
		}
	}

	/// Returns true for statuses with no outgoing transitions.
	pub fn is_terminal(&self) -> bool {
		matches!(self, RecordStatus::Completed | RecordStatus::Cancelled)
	}
}

impl fmt::Display for RecordStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Error returned when parsing an unknown status or role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: {value}")]
pub struct ParseEnumError {
	pub kind: &'static str,
	pub value: String,
}

impl FromStr for RecordStatus {
	type Err = ParseEnumError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
		RecordStatus::ALL
			.into_iter()
			.find(|status| status.as_str() == normalized)
			.ok_or_else(|| ParseEnumError {
				kind: "status",
				value: s.to_string(),
			})
	}
}

/// Role of the signed-in console user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	/// Elevated role that may approve, start and complete records.
	SuperAdmin,
	/// Standard administrator.
	Admin,
}

impl Role {
	pub fn as_str(&self) -> &'static str {
		match self {
			Role::SuperAdmin => "super_admin",
			Role::Admin => "admin",
		}
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Role {
	type Err = ParseEnumError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
			"super_admin" | "superadmin" => Ok(Role::SuperAdmin),
			"admin" => Ok(Role::Admin),
			_ => Err(ParseEnumError {
				kind: "role",
				value: s.to_string(),
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_status_wire_format() {
		let json = serde_json::to_string(&RecordStatus::InProgress).unwrap();
		assert_eq!(json, "\"in_progress\"");

		let parsed: RecordStatus = serde_json::from_str("\"cancelled\"").unwrap();
		assert_eq!(parsed, RecordStatus::Cancelled);
	}

	#[test]
	fn test_status_from_str_accepts_dashes() {
		assert_eq!("in-progress".parse::<RecordStatus>().unwrap(), RecordStatus::InProgress);
		assert_eq!(" Draft ".parse::<RecordStatus>().unwrap(), RecordStatus::Draft);
		assert!("archived".parse::<RecordStatus>().is_err());
	}

	#[test]
	fn test_terminal_statuses() {
		let terminal: Vec<_> = RecordStatus::ALL
			.into_iter()
			.filter(RecordStatus::is_terminal)
			.collect();
		assert_eq!(terminal, vec![RecordStatus::Completed, RecordStatus::Cancelled]);
	}

	#[test]
	fn test_role_parsing() {
		assert_eq!("super_admin".parse::<Role>().unwrap(), Role::SuperAdmin);
		assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
		let err = "auditor".parse::<Role>().unwrap_err();
		assert_eq!(err.to_string(), "Unknown role: auditor");
	}
}
