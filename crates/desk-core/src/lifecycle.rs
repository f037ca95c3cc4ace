//! Record status lifecycle.
//!
//! One table decides which status changes are offered to which role. Menus
//! and the workflow layer both read it; nothing else encodes transitions.
//! Records move: draft -> pending -> approved -> in_progress -> completed,
//! with cancellation and send-back paths from the review states.

use desk_types::{RecordRef, RecordStatus, Role};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use thiserror::Error;

/// Warning shown before a record moves from approved to in progress.
pub const TICKET_GENERATION_WARNING: &str =
	"Al iniciar el servicio se generarán los tickets de visita para cada establecimiento.";

/// Errors raised when an action is refused before reaching the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
	/// Edits and deletions are only possible while a record is a draft.
	#[error("{folio} está en estado {} y ya no puede {action}", .status.label())]
	Locked {
		folio: String,
		status: RecordStatus,
		action: LockedAction,
	},
	/// The requested change is not in the transition table for this role.
	#[error("No es posible cambiar {folio} de {} a {}", .from.label(), .to.label())]
	NotOffered {
		folio: String,
		from: RecordStatus,
		to: RecordStatus,
		role: Role,
	},
}

/// Action refused on a locked record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockedAction {
	Edit,
	Delete,
}

impl std::fmt::Display for LockedAction {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			LockedAction::Edit => write!(f, "editarse"),
			LockedAction::Delete => write!(f, "eliminarse"),
		}
	}
}

// Destinations are listed in menu order.
static TRANSITIONS: Lazy<HashMap<(Role, RecordStatus), &'static [RecordStatus]>> =
	Lazy::new(|| {
		use RecordStatus::*;

		let mut m: HashMap<(Role, RecordStatus), &'static [RecordStatus]> = HashMap::new();
		m.insert((Role::SuperAdmin, Draft), &[Pending]);
		m.insert((Role::SuperAdmin, Pending), &[Approved, Draft, Cancelled]);
		m.insert((Role::SuperAdmin, Approved), &[InProgress, Cancelled]);
		m.insert((Role::SuperAdmin, InProgress), &[Completed]);
		m.insert((Role::Admin, Draft), &[Pending]);
		m.insert((Role::Admin, Pending), &[Draft, Cancelled]);
		// Everything else is terminal for that role
		m
	});

/// Statuses `role` may move a record to from `from`, in menu order.
pub fn offered_transitions(role: Role, from: RecordStatus) -> &'static [RecordStatus] {
	TRANSITIONS.get(&(role, from)).copied().unwrap_or(&[])
}

pub fn is_offered(role: Role, from: RecordStatus, to: RecordStatus) -> bool {
	offered_transitions(role, from).contains(&to)
}

pub fn can_edit(status: RecordStatus) -> bool {
	status == RecordStatus::Draft
}

pub fn can_delete(status: RecordStatus) -> bool {
	status == RecordStatus::Draft
}

pub fn guard_edit(record: &RecordRef) -> Result<(), LifecycleError> {
	if can_edit(record.status) {
		Ok(())
	} else {
		Err(locked(record, LockedAction::Edit))
	}
}

pub fn guard_delete(record: &RecordRef) -> Result<(), LifecycleError> {
	if can_delete(record.status) {
		Ok(())
	} else {
		Err(locked(record, LockedAction::Delete))
	}
}

/// Checks that `role` is offered the change of `record` to `to`.
pub fn guard_transition(
	role: Role,
	record: &RecordRef,
	to: RecordStatus,
) -> Result<(), LifecycleError> {
	if is_offered(role, record.status, to) {
		Ok(())
	} else {
		Err(LifecycleError::NotOffered {
			folio: record.folio.clone(),
			from: record.status,
			to,
			role,
		})
	}
}

/// Warning to confirm before performing a transition, if any.
pub fn transition_warning(from: RecordStatus, to: RecordStatus) -> Option<&'static str> {
	match (from, to) {
		(RecordStatus::Approved, RecordStatus::InProgress) => Some(TICKET_GENERATION_WARNING),
		_ => None,
	}
}

fn locked(record: &RecordRef, action: LockedAction) -> LifecycleError {
	LifecycleError::Locked {
		folio: record.folio.clone(),
		status: record.status,
		action,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use desk_types::RecordKind;

	fn record(status: RecordStatus) -> RecordRef {
		RecordRef {
			kind: RecordKind::Quotation,
			id: "q-1".into(),
			folio: "COT-0001".into(),
			status,
		}
	}

	#[test]
	fn test_terminal_states_offer_nothing() {
		for role in [Role::SuperAdmin, Role::Admin] {
			for status in [RecordStatus::Completed, RecordStatus::Cancelled] {
				assert!(offered_transitions(role, status).is_empty());
			}
		}
	}

	#[test]
	fn test_super_admin_pending_options() {
		let offered = offered_transitions(Role::SuperAdmin, RecordStatus::Pending);
		assert_eq!(
			offered,
			&[
				RecordStatus::Approved,
				RecordStatus::Draft,
				RecordStatus::Cancelled
			]
		);
	}

	#[test]
	fn test_admin_options() {
		assert_eq!(
			offered_transitions(Role::Admin, RecordStatus::Draft),
			&[RecordStatus::Pending]
		);
		assert_eq!(
			offered_transitions(Role::Admin, RecordStatus::Pending),
			&[RecordStatus::Draft, RecordStatus::Cancelled]
		);
		assert!(offered_transitions(Role::Admin, RecordStatus::Approved).is_empty());
		assert!(offered_transitions(Role::Admin, RecordStatus::InProgress).is_empty());
		assert!(!is_offered(
			Role::Admin,
			RecordStatus::Pending,
			RecordStatus::Approved
		));
	}

	#[test]
	fn test_super_admin_forward_path() {
		assert!(is_offered(
			Role::SuperAdmin,
			RecordStatus::Approved,
			RecordStatus::InProgress
		));
		assert!(is_offered(
			Role::SuperAdmin,
			RecordStatus::InProgress,
			RecordStatus::Completed
		));
		assert!(!is_offered(
			Role::SuperAdmin,
			RecordStatus::InProgress,
			RecordStatus::Cancelled
		));
		assert!(!is_offered(
			Role::SuperAdmin,
			RecordStatus::Draft,
			RecordStatus::Approved
		));
	}

	#[test]
	fn test_only_draft_is_editable() {
		for status in RecordStatus::ALL {
			let draft = status == RecordStatus::Draft;
			assert_eq!(can_edit(status), draft);
			assert_eq!(can_delete(status), draft);
			assert_eq!(guard_edit(&record(status)).is_ok(), draft);
			assert_eq!(guard_delete(&record(status)).is_ok(), draft);
		}
	}

	#[test]
	fn test_locked_message() {
		let err = guard_delete(&record(RecordStatus::Approved)).unwrap_err();
		assert!(err.to_string().contains("COT-0001"));
		assert!(err.to_string().contains("eliminarse"));
	}

	#[test]
	fn test_guard_transition() {
		assert!(guard_transition(Role::Admin, &record(RecordStatus::Draft), RecordStatus::Pending).is_ok());
		assert!(matches!(
			guard_transition(Role::Admin, &record(RecordStatus::Approved), RecordStatus::InProgress),
			Err(LifecycleError::NotOffered { role: Role::Admin, .. })
		));
	}

	#[test]
	fn test_ticket_warning_only_when_starting() {
		assert_eq!(
			transition_warning(RecordStatus::Approved, RecordStatus::InProgress),
			Some(TICKET_GENERATION_WARNING)
		);
		assert!(transition_warning(RecordStatus::Approved, RecordStatus::Cancelled).is_none());
		assert!(transition_warning(RecordStatus::Pending, RecordStatus::Approved).is_none());
	}
}
