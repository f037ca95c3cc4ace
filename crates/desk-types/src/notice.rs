//! User-facing notices.
//!
//! Every failed action ends in exactly one notice. Nothing is retried or
//! queued; the operator re-triggers the action.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generic text shown when the backend could not be reached.
pub const CONNECTION_ERROR_MESSAGE: &str = "Error de conexión. Intenta de nuevo.";

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
	Success,
	Info,
	Warning,
	Error,
}

/// A toast-style message for the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
	pub level: NoticeLevel,
	pub message: String,
}

impl Notice {
	pub fn success(message: impl Into<String>) -> Self {
		Self {
			level: NoticeLevel::Success,
			message: message.into(),
		}
	}

	pub fn info(message: impl Into<String>) -> Self {
		Self {
			level: NoticeLevel::Info,
			message: message.into(),
		}
	}

	pub fn warning(message: impl Into<String>) -> Self {
		Self {
			level: NoticeLevel::Warning,
			message: message.into(),
		}
	}

	pub fn error(message: impl Into<String>) -> Self {
		Self {
			level: NoticeLevel::Error,
			message: message.into(),
		}
	}

	/// Notice for a request that never reached the backend.
	pub fn connection_error() -> Self {
		Self::error(CONNECTION_ERROR_MESSAGE)
	}

	pub fn is_error(&self) -> bool {
		self.level == NoticeLevel::Error
	}
}

impl fmt::Display for Notice {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let tag = match self.level {
			NoticeLevel::Success => "ok",
			NoticeLevel::Info => "info",
			NoticeLevel::Warning => "warning",
			NoticeLevel::Error => "error",
		};
		write!(f, "[{}] {}", tag, self.message)
	}
}
