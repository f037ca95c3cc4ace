//! Signed-in session.
//!
//! The session token is persisted through the storage service so a restart
//! does not force a new login. The same token is published to the client's
//! [`TokenSlot`], which attaches it to every request.

use arc_swap::ArcSwapOption;
use desk_client::{ClientError, DeskApi, TokenSlot};
use desk_storage::{StorageError, StorageService};
use desk_types::{
	check_email, require_text, AuthToken, FormErrors, LoginRequest, Notice, Role, StorageKey, User,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Storage id of the active session within the session namespace.
const CURRENT_SESSION: &str = "current";

#[derive(Debug, Error)]
pub enum SessionError {
	#[error(transparent)]
	Invalid(#[from] FormErrors),
	#[error(transparent)]
	Client(#[from] ClientError),
	#[error("Storage error: {0}")]
	Storage(String),
}

impl SessionError {
	pub fn notice(&self) -> Notice {
		match self {
			SessionError::Invalid(errors) => Notice::error(errors.to_string()),
			SessionError::Client(err) => Notice::from(err),
			SessionError::Storage(_) => Notice::error("No se pudo guardar la sesión"),
		}
	}
}

/// Token and user of a signed-in operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
	pub token: AuthToken,
	pub user: User,
}

impl Session {
	pub fn role(&self) -> Role {
		self.user.role
	}
}

pub struct SessionStore {
	api: Arc<dyn DeskApi>,
	storage: Arc<StorageService>,
	token: TokenSlot,
	current: ArcSwapOption<Session>,
}

impl SessionStore {
	pub fn new(api: Arc<dyn DeskApi>, storage: Arc<StorageService>, token: TokenSlot) -> Self {
		Self {
			api,
			storage,
			token,
			current: ArcSwapOption::empty(),
		}
	}

	pub fn current(&self) -> Option<Arc<Session>> {
		self.current.load_full()
	}

	/// Role of the signed-in user, if any.
	pub fn role(&self) -> Option<Role> {
		self.current.load_full().map(|s| s.role())
	}

	pub fn is_signed_in(&self) -> bool {
		self.current.load().is_some()
	}

	/// Signs in and persists the session.
	///
	/// Credentials are checked locally first; nothing is sent when they are
	/// incomplete.
	pub async fn login(&self, email: &str, password: &str) -> Result<Arc<Session>, SessionError> {
		let mut errors = FormErrors::new();
		require_text(&mut errors, "email", Some(email));
		if errors.message_for("email").is_none() {
			check_email(&mut errors, "email", email);
		}
		require_text(&mut errors, "password", Some(password));
		errors.into_result()?;

		let request = LoginRequest {
			email: email.trim().to_string(),
			password: password.to_string(),
		};
		let response = self.api.login(&request).await?;

		let session = Session {
			token: AuthToken::new(response.token),
			user: response.user,
		};
		self.storage
			.store(StorageKey::Session.as_str(), CURRENT_SESSION, &session)
			.await
			.map_err(|e| SessionError::Storage(e.to_string()))?;

		tracing::info!(user = %session.user.email, role = %session.role(), "Signed in");
		Ok(self.activate(session))
	}

	/// Restores a persisted session, if one exists and has not expired.
	pub async fn restore(&self) -> Result<Option<Arc<Session>>, SessionError> {
		match self
			.storage
			.retrieve::<Session>(StorageKey::Session.as_str(), CURRENT_SESSION)
			.await
		{
			Ok(session) if !session.token.is_empty() => {
				tracing::debug!(user = %session.user.email, "Restored session");
				Ok(Some(self.activate(session)))
			}
			Ok(_) | Err(StorageError::NotFound) => Ok(None),
			Err(StorageError::Serialization(e)) => {
				tracing::warn!(error = %e, "Discarding unreadable session");
				self.forget().await?;
				Ok(None)
			}
			Err(e) => Err(SessionError::Storage(e.to_string())),
		}
	}

	/// Signs out locally. The backend keeps no session state to revoke.
	pub async fn logout(&self) -> Result<(), SessionError> {
		if let Some(session) = self.current.swap(None) {
			tracing::info!(user = %session.user.email, "Signed out");
		}
		self.forget().await
	}

	fn activate(&self, session: Session) -> Arc<Session> {
		let session = Arc::new(session);
		self.token.set(session.token.clone());
		self.current.store(Some(Arc::clone(&session)));
		session
	}

	async fn forget(&self) -> Result<(), SessionError> {
		self.token.clear();
		self.storage
			.remove(StorageKey::Session.as_str(), CURRENT_SESSION)
			.await
			.map_err(|e| SessionError::Storage(e.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::workflow::tests::FakeApi;
	use desk_storage::implementations::memory::MemoryStorage;

	fn memory_storage() -> Arc<StorageService> {
		Arc::new(StorageService::new(Box::new(MemoryStorage::new())))
	}

	#[tokio::test]
	async fn test_login_persists_and_publishes_token() {
		let api = Arc::new(FakeApi::default());
		let storage = memory_storage();
		let token = TokenSlot::new();
		let store = SessionStore::new(api.clone(), storage.clone(), token.clone());

		let session = store.login(" ana@example.com ", "secret").await.unwrap();
		assert_eq!(session.role(), Role::SuperAdmin);
		assert_eq!(token.get().unwrap().expose(), "tok-ana");
		assert_eq!(api.calls(), 1);

		// A fresh store over the same storage picks the session up again
		let restored_slot = TokenSlot::new();
		let restored = SessionStore::new(api, storage, restored_slot.clone());
		let session = restored.restore().await.unwrap().unwrap();
		assert_eq!(session.user.email, "ana@example.com");
		assert!(restored_slot.is_set());
	}

	#[tokio::test]
	async fn test_login_validates_before_request() {
		let api = Arc::new(FakeApi::default());
		let store = SessionStore::new(api.clone(), memory_storage(), TokenSlot::new());

		let err = store.login("not-an-email", "").await.unwrap_err();
		match err {
			SessionError::Invalid(errors) => {
				assert!(errors.message_for("email").is_some());
				assert!(errors.message_for("password").is_some());
			}
			other => panic!("unexpected error: {:?}", other),
		}
		assert_eq!(api.calls(), 0);
	}

	#[tokio::test]
	async fn test_logout_clears_everything() {
		let api = Arc::new(FakeApi::default());
		let storage = memory_storage();
		let token = TokenSlot::new();
		let store = SessionStore::new(api, storage.clone(), token.clone());

		store.login("ana@example.com", "secret").await.unwrap();
		store.logout().await.unwrap();

		assert!(!store.is_signed_in());
		assert!(!token.is_set());
		assert!(!storage
			.exists(StorageKey::Session.as_str(), CURRENT_SESSION)
			.await
			.unwrap());
		assert!(store.restore().await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_rejected_login_surfaces_message() {
		let api = Arc::new(FakeApi::default());
		api.reject_with("Credenciales inválidas");
		let store = SessionStore::new(api, memory_storage(), TokenSlot::new());

		let err = store.login("ana@example.com", "wrong").await.unwrap_err();
		assert_eq!(err.notice(), Notice::error("Credenciales inválidas"));
		assert!(!store.is_signed_in());
	}
}
