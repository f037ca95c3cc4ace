//! Typed endpoints of the backend.

use crate::{ApiClient, ClientError};
use desk_types::{
	Client, ClientPayload, Establishment, ListQuery, LogEntry, LoginRequest, LoginResponse, Page,
	QuotationPayload, QuotationRecord, RecordKind, ServiceRecord, StatusChangeRequest,
	UploadedFile, User, UserPayload,
};

impl ApiClient {
	pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError> {
		self.post("auth/login", request).await
	}

	pub async fn list_quotations(
		&self,
		query: &ListQuery,
	) -> Result<Page<QuotationRecord>, ClientError> {
		self.get("quotations", &query.to_pairs()).await
	}

	pub async fn get_quotation(&self, id: &str) -> Result<QuotationRecord, ClientError> {
		self.get(&format!("quotations/{}", id), &[]).await
	}

	pub async fn create_quotation(
		&self,
		payload: &QuotationPayload,
	) -> Result<QuotationRecord, ClientError> {
		self.post("quotations", payload).await
	}

	pub async fn update_quotation(
		&self,
		id: &str,
		payload: &QuotationPayload,
	) -> Result<QuotationRecord, ClientError> {
		self.put(&format!("quotations/{}", id), payload).await
	}

	/// Audit timeline of a quotation, oldest first.
	pub async fn quotation_log(&self, id: &str) -> Result<Vec<LogEntry>, ClientError> {
		self.get(&format!("quotations/{}/logs", id), &[]).await
	}

	pub async fn list_services(&self, query: &ListQuery) -> Result<Page<ServiceRecord>, ClientError> {
		self.get("services", &query.to_pairs()).await
	}

	pub async fn get_service(&self, id: &str) -> Result<ServiceRecord, ClientError> {
		self.get(&format!("services/{}", id), &[]).await
	}

	/// `PUT {collection}/{id}/status`. The backend decides; the returned
	/// message is what the operator sees on success.
	pub async fn change_status(
		&self,
		kind: RecordKind,
		id: &str,
		request: &StatusChangeRequest,
	) -> Result<String, ClientError> {
		self.put_ack(&format!("{}/{}/status", kind.collection(), id), request)
			.await
	}

	pub async fn delete_record(&self, kind: RecordKind, id: &str) -> Result<String, ClientError> {
		self.delete(&format!("{}/{}", kind.collection(), id)).await
	}

	pub async fn list_clients(&self, search: Option<&str>) -> Result<Vec<Client>, ClientError> {
		self.get("clients", &search_pairs(search)).await
	}

	pub async fn get_client(&self, id: &str) -> Result<Client, ClientError> {
		self.get(&format!("clients/{}", id), &[]).await
	}

	pub async fn create_client(&self, payload: &ClientPayload) -> Result<Client, ClientError> {
		self.post("clients", payload).await
	}

	pub async fn update_client(
		&self,
		id: &str,
		payload: &ClientPayload,
	) -> Result<Client, ClientError> {
		self.put(&format!("clients/{}", id), payload).await
	}

	pub async fn delete_client(&self, id: &str) -> Result<String, ClientError> {
		self.delete(&format!("clients/{}", id)).await
	}

	pub async fn list_users(&self, search: Option<&str>) -> Result<Vec<User>, ClientError> {
		self.get("users", &search_pairs(search)).await
	}

	pub async fn create_user(&self, payload: &UserPayload) -> Result<User, ClientError> {
		self.post("users", payload).await
	}

	pub async fn update_user(&self, id: &str, payload: &UserPayload) -> Result<User, ClientError> {
		self.put(&format!("users/{}", id), payload).await
	}

	pub async fn delete_user(&self, id: &str) -> Result<String, ClientError> {
		self.delete(&format!("users/{}", id)).await
	}

	/// Establishments, optionally narrowed to one client and a search term.
	pub async fn list_establishments(
		&self,
		client_id: Option<&str>,
		search: Option<&str>,
	) -> Result<Vec<Establishment>, ClientError> {
		let mut pairs = search_pairs(search);
		if let Some(client_id) = client_id {
			pairs.push(("clientId", client_id.to_string()));
		}
		self.get("establishments", &pairs).await
	}

	/// Uploads one evidence file (photo or document).
	pub async fn upload_evidence(
		&self,
		file_name: &str,
		mime: &str,
		bytes: Vec<u8>,
	) -> Result<UploadedFile, ClientError> {
		self.upload("uploads", file_name, mime, bytes).await
	}
}

fn search_pairs(search: Option<&str>) -> Vec<(&'static str, String)> {
	search
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(|s| vec![("search", s.to_string())])
		.unwrap_or_default()
}

#[cfg(test)]
mod tests {
	use crate::{ApiClient, ClientError, TokenSlot};
	use desk_types::{ListQuery, RecordKind, RecordStatus, StatusChangeRequest};
	use serde_json::json;
	use std::time::Duration;
	use wiremock::matchers::{body_json, method, path, query_param};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn client_for(server: &MockServer) -> ApiClient {
		ApiClient::new(server.uri(), Duration::from_secs(5), TokenSlot::new()).unwrap()
	}

	fn quotation_json(id: &str, status: &str) -> serde_json::Value {
		json!({
			"id": id,
			"folio": "COT-0001",
			"status": status,
			"subtotal": "75",
			"tax": "12",
			"total": "87",
			"createdAt": "2026-03-01T10:00:00Z",
			"updatedAt": "2026-03-01T10:00:00Z"
		})
	}

	#[tokio::test]
	async fn test_list_quotations_sends_filters() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/quotations"))
			.and(query_param("search", "COT"))
			.and(query_param("status", "pending"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"ok": true,
				"data": {"items": [quotation_json("q-1", "pending")], "total": 1, "page": 1},
				"message": ""
			})))
			.expect(1)
			.mount(&server)
			.await;

		let query = ListQuery {
			search: Some("  COT ".to_string()),
			status: Some(RecordStatus::Pending),
			..Default::default()
		};
		let page = client_for(&server).list_quotations(&query).await.unwrap();
		assert_eq!(page.total, 1);
		assert_eq!(page.items[0].status, RecordStatus::Pending);
	}

	#[tokio::test]
	async fn test_change_status_puts_to_status_path() {
		let server = MockServer::start().await;
		Mock::given(method("PUT"))
			.and(path("/services/s-4/status"))
			.and(body_json(json!({"status": "in_progress"})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"ok": true,
				"data": null,
				"message": "Estado actualizado"
			})))
			.expect(1)
			.mount(&server)
			.await;

		let request = StatusChangeRequest {
			status: RecordStatus::InProgress,
			comment: None,
		};
		let message = client_for(&server)
			.change_status(RecordKind::Service, "s-4", &request)
			.await
			.unwrap();
		assert_eq!(message, "Estado actualizado");
	}

	#[tokio::test]
	async fn test_change_status_conflict_surfaces_backend_message() {
		let server = MockServer::start().await;
		Mock::given(method("PUT"))
			.and(path("/quotations/q-2/status"))
			.respond_with(ResponseTemplate::new(422).set_body_json(json!({
				"message": "Transición no permitida"
			})))
			.mount(&server)
			.await;

		let request = StatusChangeRequest {
			status: RecordStatus::Approved,
			comment: Some("ok".to_string()),
		};
		let err = client_for(&server)
			.change_status(RecordKind::Quotation, "q-2", &request)
			.await
			.unwrap_err();
		assert!(matches!(err, ClientError::Server { status: 422, ref message } if message == "Transición no permitida"));
	}

	#[tokio::test]
	async fn test_establishments_filtered_by_client() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/establishments"))
			.and(query_param("clientId", "c-1"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"ok": true,
				"data": [{"id": "e-1", "name": "Sucursal Centro"}],
				"message": ""
			})))
			.mount(&server)
			.await;

		let found = client_for(&server)
			.list_establishments(Some("c-1"), Some(""))
			.await
			.unwrap();
		assert_eq!(found.len(), 1);
		assert_eq!(found[0].name, "Sucursal Centro");

		let requests = server.received_requests().await.unwrap();
		assert!(!requests[0].url.query().unwrap_or_default().contains("search"));
	}

	#[tokio::test]
	async fn test_delete_record_uses_collection_path() {
		let server = MockServer::start().await;
		Mock::given(method("DELETE"))
			.and(path("/quotations/q-7"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"ok": true,
				"data": null,
				"message": "Cotización eliminada"
			})))
			.expect(1)
			.mount(&server)
			.await;

		let message = client_for(&server)
			.delete_record(RecordKind::Quotation, "q-7")
			.await
			.unwrap();
		assert_eq!(message, "Cotización eliminada");
	}
}
