//! Record workflows.
//!
//! Every action an operator takes on a quotation or service goes through
//! here. Local checks run first (lifecycle gates and form validation) and a
//! refused action never reaches the backend. Whatever fails is reported as a
//! single [`Notice`]; nothing is retried.

use crate::cart::{CartStore, CartSubmission};
use crate::lifecycle::{self, LifecycleError};
use desk_client::{ClientError, DeskApi};
use desk_types::{
	check_date_range, require_selection, Establishment, FormErrors, ListQuery, Notice, Page,
	QuotationPayload, QuotationRecord, RecordRef, RecordStatus, Role, ServiceRecord,
	StatusChangeRequest,
};
use std::sync::Arc;
use thiserror::Error;

/// Errors that end a workflow action.
#[derive(Debug, Error)]
pub enum WorkflowError {
	/// Refused locally by the lifecycle gates.
	#[error(transparent)]
	Lifecycle(#[from] LifecycleError),
	/// Refused locally by form validation.
	#[error(transparent)]
	Invalid(#[from] FormErrors),
	/// Failed at or on the way to the backend.
	#[error(transparent)]
	Client(#[from] ClientError),
}

impl WorkflowError {
	/// Notice to show the operator.
	pub fn notice(&self) -> Notice {
		match self {
			WorkflowError::Lifecycle(err) => Notice::warning(err.to_string()),
			WorkflowError::Invalid(errors) => Notice::error(errors.to_string()),
			WorkflowError::Client(err) => Notice::from(err),
		}
	}

	/// True when the action was refused without contacting the backend.
	pub fn is_local(&self) -> bool {
		!matches!(self, WorkflowError::Client(_))
	}
}

/// Result of an accepted status change or deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowOutcome {
	/// Message returned by the backend.
	pub message: String,
	/// Downstream effect the operator was warned about.
	pub warning: Option<&'static str>,
}

impl WorkflowOutcome {
	pub fn notice(&self) -> Notice {
		if self.message.trim().is_empty() {
			Notice::success("Operación realizada")
		} else {
			Notice::success(self.message.clone())
		}
	}
}

/// Drives quotation and service actions against the backend.
#[derive(Clone)]
pub struct RecordWorkflow {
	api: Arc<dyn DeskApi>,
}

impl RecordWorkflow {
	pub fn new(api: Arc<dyn DeskApi>) -> Self {
		Self { api }
	}

	/// Requests a status change offered to `role`.
	///
	/// Changes outside the transition table are refused locally.
	pub async fn change_status(
		&self,
		role: Role,
		record: &RecordRef,
		to: RecordStatus,
		comment: Option<String>,
	) -> Result<WorkflowOutcome, WorkflowError> {
		lifecycle::guard_transition(role, record, to)?;

		let warning = lifecycle::transition_warning(record.status, to);
		if let Some(warning) = warning {
			tracing::warn!(folio = %record.folio, "{}", warning);
		}

		let request = StatusChangeRequest {
			status: to,
			comment: comment.filter(|c| !c.trim().is_empty()),
		};
		let message = self
			.api
			.change_status(record.kind, &record.id, &request)
			.await?;

		tracing::info!(
			kind = %record.kind,
			folio = %record.folio,
			from = %record.status,
			to = %to,
			"Status changed"
		);
		Ok(WorkflowOutcome { message, warning })
	}

	/// Deletes a draft record.
	pub async fn delete(&self, record: &RecordRef) -> Result<WorkflowOutcome, WorkflowError> {
		lifecycle::guard_delete(record)?;

		let message = self.api.delete_record(record.kind, &record.id).await?;
		tracing::info!(kind = %record.kind, folio = %record.folio, "Record deleted");
		Ok(WorkflowOutcome {
			message,
			warning: None,
		})
	}

	/// Saves changes to a draft quotation.
	pub async fn update_quotation(
		&self,
		record: &RecordRef,
		payload: &QuotationPayload,
	) -> Result<QuotationRecord, WorkflowError> {
		lifecycle::guard_edit(record)?;
		validate_payload(payload)?;

		let updated = self.api.update_quotation(&record.id, payload).await?;
		tracing::info!(folio = %updated.folio, "Quotation updated");
		Ok(updated)
	}

	/// Creates a quotation from the cart and empties the cart on success.
	///
	/// On failure the cart is left as it was so the operator can retry. A
	/// cart changed while the request was in flight is kept as well.
	pub async fn submit_cart(
		&self,
		cart: &CartStore,
		submission: &CartSubmission,
	) -> Result<QuotationRecord, WorkflowError> {
		let snapshot = cart.snapshot();
		let payload = submission.payload(&snapshot, cart.rules())?;

		let created = self.api.create_quotation(&payload).await?;
		if !cart.clear_if_current(&snapshot) {
			tracing::warn!(folio = %created.folio, "Cart changed during submission, keeping it");
		}
		tracing::info!(folio = %created.folio, total = %payload.total, "Quotation created");
		Ok(created)
	}

	pub async fn list_quotations(
		&self,
		query: &ListQuery,
	) -> Result<Page<QuotationRecord>, WorkflowError> {
		validate_query(query)?;
		Ok(self.api.list_quotations(query).await?)
	}

	pub async fn list_services(
		&self,
		query: &ListQuery,
	) -> Result<Page<ServiceRecord>, WorkflowError> {
		validate_query(query)?;
		Ok(self.api.list_services(query).await?)
	}

	/// Establishments matching `term`. A blank term returns nothing without
	/// a request.
	pub async fn search_establishments(
		&self,
		term: &str,
	) -> Result<Vec<Establishment>, WorkflowError> {
		let term = term.trim();
		if term.is_empty() {
			return Ok(Vec::new());
		}
		Ok(self.api.search_establishments(term).await?)
	}
}

fn validate_query(query: &ListQuery) -> Result<(), FormErrors> {
	let mut errors = FormErrors::new();
	check_date_range(&mut errors, "dateTo", query.date_from, query.date_to);
	errors.into_result()
}

fn validate_payload(payload: &QuotationPayload) -> Result<(), FormErrors> {
	let mut errors = FormErrors::new();
	require_selection(&mut errors, "products", &payload.products);
	require_selection(&mut errors, "establishments", &payload.establishment_ids);
	errors.into_result()
}
