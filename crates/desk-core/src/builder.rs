//! Builder for the desk context.
//!
//! Assembles storage, the REST client, the session store, the workflows and
//! the cart store from a [`Config`], choosing the storage backend through a
//! map of named factories.

use crate::cart::CartStore;
use crate::fetch::FetchScope;
use crate::search::Debouncer;
use crate::session::{SessionError, SessionStore};
use crate::workflow::RecordWorkflow;
use desk_client::{ApiClient, DeskApi, TokenSlot};
use desk_config::Config;
use desk_storage::{StorageFactory, StorageService};
use desk_types::Role;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Session error: {0}")]
	Session(#[from] SessionError),
}

/// Factory functions available to the builder, keyed by implementation name.
pub struct DeskFactories {
	pub storage_factories: HashMap<String, StorageFactory>,
}

impl DeskFactories {
	/// Every storage backend shipped with the desk.
	pub fn standard() -> Self {
		Self {
			storage_factories: desk_storage::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
		}
	}
}

pub struct DeskBuilder {
	config: Config,
}

impl DeskBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Builds the desk and restores any persisted session.
	pub async fn build(self, factories: DeskFactories) -> Result<Desk, BuilderError> {
		let storage = Arc::new(self.build_storage(&factories)?);

		match storage.cleanup_expired().await {
			Ok(0) => {}
			Ok(removed) => tracing::debug!(component = "storage", removed, "Removed expired entries"),
			Err(e) => tracing::warn!(component = "storage", error = %e, "Cleanup failed"),
		}

		let token = TokenSlot::new();
		let client = Arc::new(
			ApiClient::new(
				self.config.api.base_url.clone(),
				self.config.request_timeout(),
				token.clone(),
			)
			.map_err(|e| BuilderError::Config(e.to_string()))?,
		);
		tracing::info!(component = "api", base_url = %client.base_url(), "Loaded");

		let api: Arc<dyn DeskApi> = client.clone();
		let session = Arc::new(SessionStore::new(api.clone(), storage.clone(), token));
		if let Some(restored) = session.restore().await? {
			tracing::info!(user = %restored.user.email, role = %restored.role(), "Session restored");
		}

		let cart = Arc::new(CartStore::new(self.config.pricing.clone()));

		Ok(Desk {
			workflow: RecordWorkflow::new(api),
			config: self.config,
			storage,
			client,
			session,
			cart,
		})
	}

	fn build_storage(&self, factories: &DeskFactories) -> Result<StorageService, BuilderError> {
		let primary = &self.config.storage.primary;
		let storage_config = self.config.storage.implementations.get(primary).ok_or_else(|| {
			BuilderError::Config(format!("Primary storage '{}' is not configured", primary))
		})?;
		let factory = factories.storage_factories.get(primary).ok_or_else(|| {
			BuilderError::Config(format!("Unknown storage implementation '{}'", primary))
		})?;

		match factory(storage_config) {
			Ok(backend) => {
				tracing::info!(component = "storage", implementation = %primary, "Loaded");
				Ok(StorageService::new(backend))
			}
			Err(e) => {
				tracing::error!(
					component = "storage",
					implementation = %primary,
					error = %e,
					"Failed to create storage implementation"
				);
				Err(BuilderError::Config(format!(
					"Failed to create storage implementation '{}': {}",
					primary, e
				)))
			}
		}
	}
}

/// Everything a console session works with.
pub struct Desk {
	config: Config,
	storage: Arc<StorageService>,
	client: Arc<ApiClient>,
	session: Arc<SessionStore>,
	workflow: RecordWorkflow,
	cart: Arc<CartStore>,
}

impl Desk {
	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn client(&self) -> &Arc<ApiClient> {
		&self.client
	}

	pub fn session(&self) -> &Arc<SessionStore> {
		&self.session
	}

	pub fn workflow(&self) -> &RecordWorkflow {
		&self.workflow
	}

	pub fn cart(&self) -> &Arc<CartStore> {
		&self.cart
	}

	/// Role of the signed-in user, or the configured default when signed out.
	pub fn role(&self) -> Role {
		self.session.role().unwrap_or(self.config.desk.role)
	}

	/// New debouncer using the configured search window.
	pub fn search_debouncer<T: Send + 'static>(
		&self,
	) -> (Debouncer<T>, tokio::sync::mpsc::UnboundedReceiver<T>) {
		Debouncer::spawn(self.config.debounce())
	}

	/// New fetch scope for a view.
	pub fn fetch_scope(&self) -> FetchScope {
		FetchScope::new()
	}

	/// Periodically removes expired storage entries until `shutdown` fires.
	pub fn spawn_storage_cleanup(&self, shutdown: CancellationToken) -> JoinHandle<()> {
		let storage = Arc::clone(&self.storage);
		let period = Duration::from_secs(self.config.storage.cleanup_interval_seconds.max(1));

		tokio::spawn(async move {
			let mut interval = tokio::time::interval(period);
			// The first tick completes immediately; the builder already cleaned up
			interval.tick().await;
			loop {
				tokio::select! {
					_ = shutdown.cancelled() => break,
					_ = interval.tick() => {
						match storage.cleanup_expired().await {
							Ok(0) => {}
							Ok(removed) => tracing::debug!(component = "storage", removed, "Removed expired entries"),
							Err(e) => tracing::warn!(component = "storage", error = %e, "Cleanup failed"),
						}
					}
				}
			}
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use desk_types::{RecordStatus, StorageKey};
	use tempfile::TempDir;

	fn config_with(storage: &str) -> Config {
		format!(
			r#"
[desk]
id = "desk-test"
role = "super_admin"

[api]
base_url = "http://127.0.0.1:9/api"

[storage]
primary = "{}"
cleanup_interval_seconds = 60

[storage.implementations.memory]

[storage.implementations.file]
storage_path = "/nonexistent/desk-test"
"#,
			storage
		)
		.parse()
		.unwrap()
	}

	#[tokio::test]
	async fn test_build_with_memory_storage() {
		let desk = DeskBuilder::new(config_with("memory"))
			.build(DeskFactories::standard())
			.await
			.unwrap();

		assert!(!desk.session().is_signed_in());
		assert_eq!(desk.role(), Role::SuperAdmin);
		assert!(desk.cart().snapshot().is_empty());
		assert_eq!(desk.cart().total(), rust_decimal::Decimal::from(45));
		assert!(!desk.client().token_slot().is_set());
	}

	#[tokio::test]
	async fn test_unknown_factory_is_rejected() {
		let factories = DeskFactories {
			storage_factories: HashMap::new(),
		};
		let result = DeskBuilder::new(config_with("memory")).build(factories).await;
		assert!(matches!(result, Err(BuilderError::Config(_))));
	}

	#[tokio::test]
	async fn test_restores_persisted_session() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().display().to_string();
		let mut config = config_with("file");
		config.storage.implementations.insert(
			"file".into(),
			toml::Value::Table(toml::map::Map::from_iter([(
				"storage_path".to_string(),
				toml::Value::String(path.clone()),
			)])),
		);

		let backend = desk_storage::implementations::file::create_storage(
			&config.storage.implementations["file"],
		)
		.unwrap();
		StorageService::new(backend)
			.store(
				StorageKey::Session.as_str(),
				"current",
				&stored_session(),
			)
			.await
			.unwrap();

		let desk = DeskBuilder::new(config)
			.build(DeskFactories::standard())
			.await
			.unwrap();
		assert!(desk.session().is_signed_in());
		assert_eq!(desk.role(), Role::Admin);
		assert_eq!(desk.client().token_slot().get().unwrap().expose(), "tok-luis");
		assert!(crate::lifecycle::offered_transitions(desk.role(), RecordStatus::Approved).is_empty());
	}

	fn stored_session() -> crate::session::Session {
		crate::session::Session {
			token: desk_types::AuthToken::from("tok-luis"),
			user: desk_types::User {
				id: "u-2".into(),
				name: "Luis".into(),
				email: "luis@example.com".into(),
				role: Role::Admin,
				active: true,
			},
		}
	}

	#[tokio::test(start_paused = true)]
	async fn test_search_debouncer_uses_configured_window() {
		let mut config = config_with("memory");
		config.search.debounce_ms = 500;
		let desk = DeskBuilder::new(config)
			.build(DeskFactories::standard())
			.await
			.unwrap();

		let (debouncer, mut settled) = desk.search_debouncer::<String>();
		debouncer.trigger("cent".into());
		debouncer.trigger("centro".into());

		// Quieter than the default 300 ms but inside the configured window
		tokio::time::sleep(Duration::from_millis(400)).await;
		assert!(settled.try_recv().is_err());

		tokio::time::sleep(Duration::from_millis(150)).await;
		assert_eq!(settled.try_recv().unwrap(), "centro");
		assert!(settled.try_recv().is_err());
	}

	#[tokio::test(start_paused = true)]
	async fn test_cleanup_task_stops_on_shutdown() {
		let desk = DeskBuilder::new(config_with("memory"))
			.build(DeskFactories::standard())
			.await
			.unwrap();

		let shutdown = CancellationToken::new();
		let handle = desk.spawn_storage_cleanup(shutdown.clone());
		tokio::time::sleep(Duration::from_secs(120)).await;
		shutdown.cancel();
		handle.await.unwrap();
	}
}
