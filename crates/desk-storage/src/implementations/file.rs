//! File-based storage backend.
//!
//! Each key is one file under the configured directory. Files start with a
//! fixed header carrying an expiry timestamp so a persisted session can lapse
//! without a running process to delete it.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use desk_types::StorageKey;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;

/// Seconds since the Unix epoch.
fn unix_now() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.unwrap_or_default()
		.as_secs()
}

#[allow(clippy::doc_nested_refdefs)]
/// Fixed-size file header.
///
/// Layout (32 bytes):
/// - [0-3]: magic "DESK"
/// - [4-5]: version (u16, little-endian)
/// - [6-13]: expiry (u64, little-endian, Unix seconds, 0 = never)
/// - [14-31]: reserved, zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileHeader {
	version: u16,
	expires_at: u64,
}

impl FileHeader {
	const MAGIC: &'static [u8; 4] = b"DESK";
	const VERSION: u16 = 1;
	const SIZE: usize = 32;

	fn with_ttl(ttl: Duration) -> Self {
		let expires_at = if ttl.is_zero() {
			0
		} else {
			unix_now().saturating_add(ttl.as_secs())
		};
		Self {
			version: Self::VERSION,
			expires_at,
		}
	}

	fn encode(&self) -> [u8; Self::SIZE] {
		let mut bytes = [0u8; Self::SIZE];
		bytes[0..4].copy_from_slice(Self::MAGIC);
		bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
		bytes[6..14].copy_from_slice(&self.expires_at.to_le_bytes());
		bytes
	}

	fn decode(bytes: &[u8]) -> Result<Self, StorageError> {
		if bytes.len() < Self::SIZE {
			return Err(StorageError::Backend("File too small for header".into()));
		}
		if &bytes[0..4] != Self::MAGIC {
			return Err(StorageError::Backend("Unrecognized file header".into()));
		}

		let version = u16::from_le_bytes([bytes[4], bytes[5]]);
		if version > Self::VERSION {
			return Err(StorageError::Backend(format!(
				"Unsupported file version: {}",
				version
			)));
		}

		let mut expires = [0u8; 8];
		expires.copy_from_slice(&bytes[6..14]);
		Ok(Self {
			version,
			expires_at: u64::from_le_bytes(expires),
		})
	}

	fn is_expired(&self) -> bool {
		self.expires_at != 0 && unix_now() >= self.expires_at
	}
}

/// Default TTL per storage namespace, read from `ttl_<namespace>` keys.
#[derive(Debug, Clone, Default)]
pub struct TtlConfig {
	ttls: HashMap<StorageKey, Duration>,
}

impl TtlConfig {
	fn from_config(config: &toml::Value) -> Result<Self, StorageError> {
		let mut ttls = HashMap::new();
		for storage_key in StorageKey::all() {
			let config_key = format!("ttl_{}", storage_key.as_str());
			match config.get(&config_key) {
				None => {}
				Some(value) => {
					let seconds = value
						.as_integer()
						.filter(|s| *s >= 0)
						.ok_or_else(|| {
							StorageError::Configuration(format!(
								"'{}' must be a non-negative integer",
								config_key
							))
						})?;
					ttls.insert(storage_key, Duration::from_secs(seconds as u64));
				}
			}
		}
		Ok(Self { ttls })
	}

	/// TTL for a `namespace:id` key; zero when none is configured.
	fn for_key(&self, key: &str) -> Duration {
		key.split(':')
			.next()
			.and_then(|namespace| namespace.parse::<StorageKey>().ok())
			.and_then(|storage_key| self.ttls.get(&storage_key).copied())
			.unwrap_or(Duration::ZERO)
	}
}

/// File-based storage implementation.
pub struct FileStorage {
	base_path: PathBuf,
	ttl_config: TtlConfig,
}

impl FileStorage {
	pub fn new(base_path: PathBuf, ttl_config: TtlConfig) -> Self {
		Self {
			base_path,
			ttl_config,
		}
	}

	/// Maps a key to a filesystem-safe path.
	fn path_for(&self, key: &str) -> PathBuf {
		let safe_key = key.replace(['/', '\\', ':'], "_");
		self.base_path.join(format!("{}.bin", safe_key))
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let data = match fs::read(self.path_for(key)).await {
			Ok(data) => data,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				return Err(StorageError::NotFound)
			}
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let header = FileHeader::decode(&data)?;
		if header.is_expired() {
			return Err(StorageError::NotFound);
		}
		Ok(data[FileHeader::SIZE..].to_vec())
	}

	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		fs::create_dir_all(&self.base_path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		let ttl = ttl.unwrap_or_else(|| self.ttl_config.for_key(key));
		let mut contents = Vec::with_capacity(FileHeader::SIZE + value.len());
		contents.extend_from_slice(&FileHeader::with_ttl(ttl).encode());
		contents.extend_from_slice(&value);

		// Write to a sibling temp file and rename so readers never see a partial file
		let path = self.path_for(key);
		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, contents)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		match fs::remove_file(self.path_for(key)).await {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		match self.get_bytes(key).await {
			Ok(_) => Ok(true),
			Err(StorageError::NotFound) => Ok(false),
			Err(e) => Err(e),
		}
	}

	async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		let mut entries = match fs::read_dir(&self.base_path).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let mut removed = 0;
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() != Some(std::ffi::OsStr::new("bin")) {
				continue;
			}

			let expired = match fs::read(&path).await {
				Ok(data) => FileHeader::decode(&data).is_ok_and(|h| h.is_expired()),
				Err(e) => {
					tracing::debug!("Skipping file {:?}: could not be read: {}", path, e);
					false
				}
			};

			if expired {
				match fs::remove_file(&path).await {
					Ok(()) => removed += 1,
					Err(e) => tracing::warn!("Failed to remove expired file {:?}: {}", path, e),
				}
			}
		}
		Ok(removed)
	}
}

/// Builds a file backend from its configuration.
///
/// Configuration parameters:
/// - `storage_path`: directory for the files (default: "./data/session")
/// - `ttl_session`: TTL in seconds for session entries (default: 0, never)
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	let storage_path = match config.get("storage_path") {
		None => "./data/session".to_string(),
		Some(value) => value
			.as_str()
			.filter(|path| !path.trim().is_empty())
			.ok_or_else(|| {
				StorageError::Configuration("'storage_path' must be a non-empty string".into())
			})?
			.to_string(),
	};

	let ttl_config = TtlConfig::from_config(config)?;
	Ok(Box::new(FileStorage::new(
		PathBuf::from(storage_path),
		ttl_config,
	)))
}

/// Registry for the file backend.
pub struct Registry;

impl StorageRegistry for Registry {
	const NAME: &'static str = "file";

	fn factory() -> StorageFactory {
		create_storage
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	fn storage_in(dir: &TempDir) -> FileStorage {
		FileStorage::new(dir.path().to_path_buf(), TtlConfig::default())
	}

	#[tokio::test]
	async fn test_persists_across_instances() {
		let dir = TempDir::new().unwrap();
		storage_in(&dir)
			.set_bytes("session:current", b"token".to_vec(), None)
			.await
			.unwrap();

		let reopened = storage_in(&dir);
		assert_eq!(
			reopened.get_bytes("session:current").await.unwrap(),
			b"token".to_vec()
		);
		assert!(dir.path().join("session_current.bin").exists());
	}

	#[tokio::test]
	async fn test_delete_missing_is_ok() {
		let dir = TempDir::new().unwrap();
		let storage = storage_in(&dir);
		storage.delete("session:none").await.unwrap();
		assert!(!storage.exists("session:none").await.unwrap());
	}

	#[tokio::test]
	async fn test_expired_header_reads_as_missing() {
		let dir = TempDir::new().unwrap();
		let storage = storage_in(&dir);

		let stale = FileHeader {
			version: FileHeader::VERSION,
			expires_at: 1,
		};
		let mut contents = stale.encode().to_vec();
		contents.extend_from_slice(b"old");
		std::fs::write(dir.path().join("session_old.bin"), contents).unwrap();
		storage
			.set_bytes("session:fresh", b"new".to_vec(), Some(Duration::from_secs(3600)))
			.await
			.unwrap();

		assert!(matches!(
			storage.get_bytes("session:old").await,
			Err(StorageError::NotFound)
		));
		assert_eq!(storage.cleanup_expired().await.unwrap(), 1);
		assert!(storage.exists("session:fresh").await.unwrap());
	}

	#[test]
	fn test_header_rejects_foreign_files() {
		assert!(FileHeader::decode(b"short").is_err());
		assert!(FileHeader::decode(&[b'X'; FileHeader::SIZE]).is_err());

		let header = FileHeader::with_ttl(Duration::ZERO);
		assert_eq!(FileHeader::decode(&header.encode()).unwrap(), header);
		assert!(!header.is_expired());
	}

	#[test]
	fn test_factory_validates_config() {
		let config: toml::Value = toml::from_str("ttl_session = -5").unwrap();
		assert!(matches!(
			create_storage(&config),
			Err(StorageError::Configuration(_))
		));

		let config: toml::Value = toml::from_str("storage_path = 3").unwrap();
		assert!(create_storage(&config).is_err());

		let config: toml::Value =
			toml::from_str("storage_path = \"/tmp/desk\"\nttl_session = 86400").unwrap();
		assert!(create_storage(&config).is_ok());
	}

	#[test]
	fn test_ttl_lookup_by_namespace() {
		let config: toml::Value = toml::from_str("ttl_session = 120").unwrap();
		let ttl = TtlConfig::from_config(&config).unwrap();
		assert_eq!(ttl.for_key("session:current"), Duration::from_secs(120));
		assert_eq!(ttl.for_key("other:key"), Duration::ZERO);
	}
}
