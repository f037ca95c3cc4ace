//! REST client for the audit desk backend.
//!
//! Wraps `reqwest` with the conventions of the backend: every path hangs off
//! a configured base URL, a bearer token is attached whenever the session
//! holds one, and every response body is the `{ ok, data, message }`
//! envelope. Failures are classified so callers can turn them into notices.

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use desk_types::{
	ApiEnvelope, ApiErrorBody, AuthToken, Establishment, ListQuery, LoginRequest, LoginResponse,
	Notice, Page, QuotationPayload, QuotationRecord, RecordKind, ServiceRecord,
	StatusChangeRequest,
};
use reqwest::header::HeaderValue;
use reqwest::{Method, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

mod endpoints;

/// Header carrying a per-request id, echoed in logs on both sides.
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Message shown when the backend answered `ok: false` without a message.
const GENERIC_FAILURE: &str = "La operación no pudo completarse";

/// Errors that can occur while talking to the backend.
#[derive(Debug, Error)]
pub enum ClientError {
	/// The request never got a response (DNS, refused connection, timeout).
	#[error("Connection error: {0}")]
	Connection(String),
	/// The backend answered with a non-2xx status.
	#[error("{message}")]
	Server { status: u16, message: String },
	/// The backend answered 2xx with `ok: false`.
	#[error("{0}")]
	Rejected(String),
	/// The response body was not the expected JSON.
	#[error("Invalid response: {0}")]
	Decode(String),
	/// The envelope was successful but carried no data.
	#[error("Response contained no data")]
	EmptyData,
	/// The request could not be built.
	#[error("Invalid request: {0}")]
	Request(String),
}

impl ClientError {
	/// True when the backend was never reached.
	pub fn is_connection(&self) -> bool {
		matches!(self, ClientError::Connection(_))
	}

	/// True when the backend refused the session token.
	pub fn is_unauthorized(&self) -> bool {
		matches!(self, ClientError::Server { status: 401, .. })
	}
}

impl From<&ClientError> for Notice {
	fn from(err: &ClientError) -> Self {
		match err {
			ClientError::Connection(_) => Notice::connection_error(),
			ClientError::Server { message, .. } | ClientError::Rejected(message) => {
				Notice::error(message.clone())
			}
			ClientError::Decode(_) | ClientError::EmptyData => {
				Notice::error("Respuesta inválida del servidor")
			}
			ClientError::Request(message) => Notice::error(message.clone()),
		}
	}
}

/// Shared holder of the current session token.
///
/// The session store writes it; every request reads it.
#[derive(Debug, Clone, Default)]
pub struct TokenSlot {
	inner: Arc<ArcSwapOption<AuthToken>>,
}

impl TokenSlot {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set(&self, token: AuthToken) {
		self.inner.store(Some(Arc::new(token)));
	}

	pub fn clear(&self) {
		self.inner.store(None);
	}

	pub fn get(&self) -> Option<Arc<AuthToken>> {
		self.inner.load_full()
	}

	pub fn is_set(&self) -> bool {
		self.inner.load().is_some()
	}
}

/// HTTP client bound to one backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
	http: reqwest::Client,
	base_url: String,
	token: TokenSlot,
}

impl ApiClient {
	/// Creates a client for `base_url` with the given request timeout.
	pub fn new(
		base_url: impl Into<String>,
		timeout: Duration,
		token: TokenSlot,
	) -> Result<Self, ClientError> {
		let http = reqwest::Client::builder()
			.pool_idle_timeout(Duration::from_secs(90))
			.timeout(timeout)
			.build()
			.map_err(|e| ClientError::Request(format!("Failed to build HTTP client: {}", e)))?;

		Ok(Self {
			http,
			base_url: base_url.into().trim_end_matches('/').to_string(),
			token,
		})
	}

	/// Token slot shared with the session store.
	pub fn token_slot(&self) -> &TokenSlot {
		&self.token
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	fn url(&self, path: &str) -> String {
		format!("{}/{}", self.base_url, path.trim_start_matches('/'))
	}

	fn request(&self, method: Method, path: &str) -> RequestBuilder {
		let builder = self.http.request(method, self.url(path));
		match self.token.get() {
			Some(token) if !token.is_empty() => {
				match HeaderValue::from_str(&token.bearer_value()) {
					Ok(mut value) => {
						value.set_sensitive(true);
						builder.header(reqwest::header::AUTHORIZATION, value)
					}
					Err(_) => {
						tracing::warn!("Session token is not a valid header value, sending without it");
						builder
					}
				}
			}
			_ => builder,
		}
	}

	/// Sends a request and decodes the envelope.
	async fn send<T: DeserializeOwned>(
		&self,
		builder: RequestBuilder,
	) -> Result<ApiEnvelope<T>, ClientError> {
		let mut request = builder
			.build()
			.map_err(|e| ClientError::Request(e.to_string()))?;
		let method = request.method().clone();
		let path = request.url().path().to_string();
		let request_id = Uuid::new_v4();

		if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
			request.headers_mut().insert(REQUEST_ID_HEADER, value);
		}

		let response = self.http.execute(request).await.map_err(|e| {
			tracing::warn!(%request_id, %method, %path, error = %e, "Backend unreachable");
			ClientError::Connection(e.to_string())
		})?;

		let status = response.status();
		tracing::debug!(%request_id, %method, %path, status = status.as_u16(), "Backend responded");

		let body = response
			.bytes()
			.await
			.map_err(|e| ClientError::Connection(e.to_string()))?;

		if !status.is_success() {
			let error_body: ApiErrorBody = serde_json::from_slice(&body).unwrap_or_default();
			let message = error_body.describe(status.as_u16());
			tracing::warn!(%method, %path, status = status.as_u16(), %message, "Request failed");
			return Err(ClientError::Server {
				status: status.as_u16(),
				message,
			});
		}

		let envelope: ApiEnvelope<T> =
			serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))?;

		if !envelope.ok {
			let message = if envelope.message.trim().is_empty() {
				GENERIC_FAILURE.to_string()
			} else {
				envelope.message
			};
			tracing::info!(%method, %path, %message, "Backend rejected request");
			return Err(ClientError::Rejected(message));
		}

		Ok(envelope)
	}

	/// Sends a request whose envelope must carry data.
	async fn send_data<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
		self.send::<T>(builder).await?.data.ok_or(ClientError::EmptyData)
	}

	/// Sends a request whose data is ignored; returns the backend message.
	async fn send_ack(&self, builder: RequestBuilder) -> Result<String, ClientError> {
		Ok(self.send::<serde_json::Value>(builder).await?.message)
	}

	/// `GET path?query`.
	pub async fn get<T: DeserializeOwned>(
		&self,
		path: &str,
		query: &[(&str, String)],
	) -> Result<T, ClientError> {
		self.send_data(self.request(Method::GET, path).query(query))
			.await
	}

	/// `POST path` with a JSON body.
	pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
		&self,
		path: &str,
		body: &B,
	) -> Result<T, ClientError> {
		self.send_data(self.request(Method::POST, path).json(body))
			.await
	}

	/// `PUT path` with a JSON body.
	pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
		&self,
		path: &str,
		body: &B,
	) -> Result<T, ClientError> {
		self.send_data(self.request(Method::PUT, path).json(body))
			.await
	}

	/// `PUT path` with a JSON body, ignoring returned data.
	pub async fn put_ack<B: Serialize + ?Sized>(
		&self,
		path: &str,
		body: &B,
	) -> Result<String, ClientError> {
		self.send_ack(self.request(Method::PUT, path).json(body))
			.await
	}

	/// `DELETE path`; returns the backend message.
	pub async fn delete(&self, path: &str) -> Result<String, ClientError> {
		self.send_ack(self.request(Method::DELETE, path)).await
	}

	/// `POST path` with a multipart form holding one file under `file`.
	pub async fn upload<T: DeserializeOwned>(
		&self,
		path: &str,
		file_name: &str,
		mime: &str,
		bytes: Vec<u8>,
	) -> Result<T, ClientError> {
		let part = reqwest::multipart::Part::bytes(bytes)
			.file_name(file_name.to_string())
			.mime_str(mime)
			.map_err(|e| ClientError::Request(format!("Invalid MIME type '{}': {}", mime, e)))?;
		let form = reqwest::multipart::Form::new().part("file", part);
		self.send_data(self.request(Method::POST, path).multipart(form))
			.await
	}
}

/// Backend operations the desk workflows depend on.
///
/// [`ApiClient`] is the production implementation; tests substitute fakes.
#[async_trait]
pub trait DeskApi: Send + Sync {
	async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError>;

	async fn list_quotations(&self, query: &ListQuery) -> Result<Page<QuotationRecord>, ClientError>;

	async fn list_services(&self, query: &ListQuery) -> Result<Page<ServiceRecord>, ClientError>;

	async fn search_establishments(&self, search: &str) -> Result<Vec<Establishment>, ClientError>;

	async fn create_quotation(
		&self,
		payload: &QuotationPayload,
	) -> Result<QuotationRecord, ClientError>;

	async fn update_quotation(
		&self,
		id: &str,
		payload: &QuotationPayload,
	) -> Result<QuotationRecord, ClientError>;

	/// Requests a status change; returns the backend message.
	async fn change_status(
		&self,
		kind: RecordKind,
		id: &str,
		request: &StatusChangeRequest,
	) -> Result<String, ClientError>;

	/// Deletes a record; returns the backend message.
	async fn delete_record(&self, kind: RecordKind, id: &str) -> Result<String, ClientError>;
}

#[async_trait]
impl DeskApi for ApiClient {
	async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError> {
		ApiClient::login(self, request).await
	}

	async fn list_quotations(&self, query: &ListQuery) -> Result<Page<QuotationRecord>, ClientError> {
		ApiClient::list_quotations(self, query).await
	}

	async fn list_services(&self, query: &ListQuery) -> Result<Page<ServiceRecord>, ClientError> {
		ApiClient::list_services(self, query).await
	}

	async fn search_establishments(&self, search: &str) -> Result<Vec<Establishment>, ClientError> {
		ApiClient::list_establishments(self, None, Some(search)).await
	}

	async fn create_quotation(
		&self,
		payload: &QuotationPayload,
	) -> Result<QuotationRecord, ClientError> {
		ApiClient::create_quotation(self, payload).await
	}

	async fn update_quotation(
		&self,
		id: &str,
		payload: &QuotationPayload,
	) -> Result<QuotationRecord, ClientError> {
		ApiClient::update_quotation(self, id, payload).await
	}

	async fn change_status(
		&self,
		kind: RecordKind,
		id: &str,
		request: &StatusChangeRequest,
	) -> Result<String, ClientError> {
		ApiClient::change_status(self, kind, id, request).await
	}

	async fn delete_record(&self, kind: RecordKind, id: &str) -> Result<String, ClientError> {
		ApiClient::delete_record(self, kind, id).await
	}
}
