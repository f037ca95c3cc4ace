//! Backend-owned records and request payloads.
//!
//! The console never mutates these records in place. It requests changes
//! through the REST backend and re-fetches the result.

use crate::{FieldKind, RecordStatus, Role};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of status-bearing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
	Quotation,
	Service,
}

impl RecordKind {
	/// Path segment of the REST collection for this kind.
	pub fn collection(&self) -> &'static str {
		match self {
			RecordKind::Quotation => "quotations",
			RecordKind::Service => "services",
		}
	}
}

impl fmt::Display for RecordKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			RecordKind::Quotation => write!(f, "quotation"),
			RecordKind::Service => write!(f, "service"),
		}
	}
}

/// Minimal view of a status-bearing record used by the lifecycle gates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
	pub kind: RecordKind,
	pub id: String,
	pub folio: String,
	pub status: RecordStatus,
}

/// A physical retail location targeted by a quotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Establishment {
	pub id: String,
	pub name: String,
	#[serde(default)]
	pub address: Option<String>,
	#[serde(default)]
	pub city: Option<String>,
	#[serde(default)]
	pub client_id: Option<String>,
}

/// A checklist question attached to a quotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationQuestion {
	pub id: String,
	pub text: String,
	pub price: Decimal,
}

/// A product line of a quotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationProduct {
	pub id: String,
	pub name: String,
	#[serde(default)]
	pub images: Vec<String>,
	#[serde(default)]
	pub fields: Vec<FieldKind>,
}

/// A priced service request as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationRecord {
	pub id: String,
	pub folio: String,
	pub status: RecordStatus,
	pub subtotal: Decimal,
	pub tax: Decimal,
	pub total: Decimal,
	#[serde(default)]
	pub client_id: Option<String>,
	#[serde(default)]
	pub establishments: Vec<Establishment>,
	#[serde(default)]
	pub questions: Vec<QuotationQuestion>,
	#[serde(default)]
	pub products: Vec<QuotationProduct>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl QuotationRecord {
	pub fn to_ref(&self) -> RecordRef {
		RecordRef {
			kind: RecordKind::Quotation,
			id: self.id.clone(),
			folio: self.folio.clone(),
			status: self.status,
		}
	}
}

/// Simplified sibling of a quotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
	pub id: String,
	pub folio: String,
	pub status: RecordStatus,
	#[serde(default)]
	pub client_id: Option<String>,
	#[serde(default)]
	pub description: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl ServiceRecord {
	pub fn to_ref(&self) -> RecordRef {
		RecordRef {
			kind: RecordKind::Service,
			id: self.id.clone(),
			folio: self.folio.clone(),
			status: self.status,
		}
	}
}

/// One entry of a record's audit timeline (bitácora).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
	pub id: String,
	pub action: String,
	#[serde(default)]
	pub from_status: Option<RecordStatus>,
	#[serde(default)]
	pub to_status: Option<RecordStatus>,
	#[serde(default)]
	pub user_name: Option<String>,
	#[serde(default)]
	pub comment: Option<String>,
	pub created_at: DateTime<Utc>,
}

/// A business client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
	pub id: String,
	pub name: String,
	#[serde(default)]
	pub tax_id: Option<String>,
	#[serde(default)]
	pub email: Option<String>,
	#[serde(default)]
	pub phone: Option<String>,
	#[serde(default = "default_true")]
	pub active: bool,
}

/// Payload for creating or updating a client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPayload {
	pub name: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub tax_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub phone: Option<String>,
}

/// A console user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	pub id: String,
	pub name: String,
	pub email: String,
	pub role: Role,
	#[serde(default = "default_true")]
	pub active: bool,
}

/// Payload for creating or updating a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
	pub name: String,
	pub email: String,
	pub role: Role,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub password: Option<String>,
}

fn default_true() -> bool {
	true
}

/// Credentials sent to the login endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
	pub email: String,
	pub password: String,
}

impl fmt::Debug for LoginRequest {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LoginRequest")
			.field("email", &self.email)
			.field("password", &"***REDACTED***")
			.finish()
	}
}

/// Successful login payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
	pub token: String,
	pub user: User,
}

/// A product line as submitted with a new quotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductLine {
	pub product_id: String,
	pub question_ids: Vec<String>,
}

/// Payload for creating or updating a quotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationPayload {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub client_id: Option<String>,
	pub establishment_ids: Vec<String>,
	pub products: Vec<ProductLine>,
	pub total: Decimal,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub notes: Option<String>,
}

/// Payload for a status change request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChangeRequest {
	pub status: RecordStatus,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub comment: Option<String>,
}

/// Filters for list endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub search: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub status: Option<RecordStatus>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub date_from: Option<NaiveDate>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub date_to: Option<NaiveDate>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub page: Option<u32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub limit: Option<u32>,
}

impl ListQuery {
	/// Query string pairs for the filters that are set.
	pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
		let mut pairs = Vec::new();
		if let Some(search) = self.search.as_deref().map(str::trim) {
			if !search.is_empty() {
				pairs.push(("search", search.to_string()));
			}
		}
		if let Some(status) = self.status {
			pairs.push(("status", status.to_string()));
		}
		if let Some(from) = self.date_from {
			pairs.push(("dateFrom", from.to_string()));
		}
		if let Some(to) = self.date_to {
			pairs.push(("dateTo", to.to_string()));
		}
		if let Some(page) = self.page {
			pairs.push(("page", page.to_string()));
		}
		if let Some(limit) = self.limit {
			pairs.push(("limit", limit.to_string()));
		}
		pairs
	}
}

/// A page of list results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
	pub items: Vec<T>,
	#[serde(default)]
	pub total: u64,
	#[serde(default)]
	pub page: u32,
}

/// Result of an evidence upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
	pub url: String,
	#[serde(default)]
	pub file_name: Option<String>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_quotation_record_from_backend_json() {
		let json = serde_json::json!({
			"id": "q-1",
			"folio": "COT-0001",
			"status": "pending",
			"subtotal": 100,
			"tax": "16",
			"total": 116.0,
			"establishments": [{"id": "e-1", "name": "Sucursal Centro"}],
			"createdAt": "2026-01-10T12:00:00Z",
			"updatedAt": "2026-01-11T08:30:00Z"
		});

		let record: QuotationRecord = serde_json::from_value(json).unwrap();
		assert_eq!(record.status, RecordStatus::Pending);
		assert_eq!(record.total, Decimal::from(116));
		assert_eq!(record.establishments[0].name, "Sucursal Centro");
		assert!(record.products.is_empty());

		let reference = record.to_ref();
		assert_eq!(reference.kind, RecordKind::Quotation);
		assert_eq!(reference.folio, "COT-0001");
	}

	#[test]
	fn test_list_query_pairs_skip_blank_search() {
		let query = ListQuery {
			search: Some("   ".into()),
			status: Some(RecordStatus::InProgress),
			date_from: NaiveDate::from_ymd_opt(2026, 1, 1),
			..Default::default()
		};

		let pairs = query.to_pairs();
		assert_eq!(
			pairs,
			vec![
				("status", "in_progress".to_string()),
				("dateFrom", "2026-01-01".to_string()),
			]
		);
	}
}
