//! Configuration module for the audit desk.
//!
//! Configuration is read from TOML files. `${VAR}` and `${VAR:-default}`
//! placeholders are replaced with environment variables before parsing, and
//! the parsed configuration is validated before it is handed out.
//!
//! ## Modular Configuration Support
//!
//! A file may pull in others with `include = ["api.toml", "storage.toml"]`.
//! Every top-level section must be defined in exactly one file.

mod loader;

use desk_types::{PricingRules, Role};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message only; the full error embeds the whole input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the desk.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity of this console instance.
	pub desk: DeskConfig,
	/// REST backend connection.
	pub api: ApiConfig,
	/// Fee schedule used by the quote cart.
	#[serde(default)]
	pub pricing: PricingRules,
	/// Search behaviour of list views.
	#[serde(default)]
	pub search: SearchConfig,
	/// Storage backend for persisted session state.
	pub storage: StorageConfig,
}

/// Configuration specific to the console instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeskConfig {
	/// Identifier used in logs.
	pub id: String,
	/// Role assumed when no session has been restored yet.
	#[serde(default = "default_role")]
	pub role: Role,
}

fn default_role() -> Role {
	Role::Admin
}

/// Configuration for the REST backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Base URL every endpoint path is appended to.
	pub base_url: String,
	/// Request timeout in seconds.
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
}

/// Returns the default request timeout in seconds.
fn default_api_timeout() -> u64 {
	30
}

/// Configuration for debounced search.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
	/// Quiet period after the last keystroke before a search is sent.
	#[serde(default = "default_debounce_ms")]
	pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
	300
}

impl Default for SearchConfig {
	fn default() -> Self {
		Self {
			debounce_ms: default_debounce_ms(),
		}
	}
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
	/// Interval in seconds for cleaning up expired storage entries.
	#[serde(default = "default_cleanup_interval")]
	pub cleanup_interval_seconds: u64,
}

fn default_cleanup_interval() -> u64 {
	3600
}

/// Replaces `${VAR}` and `${VAR:-default}` with environment values.
///
/// Input is capped at 1MB so the regex never runs over unbounded text.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut resolved = String::with_capacity(input.len());
	let mut last = 0;

	for cap in re.captures_iter(input) {
		let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};

		let value = match std::env::var(name.as_str()) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						name.as_str()
					)))
				}
			},
		};

		resolved.push_str(&input[last..whole.start()]);
		resolved.push_str(&value);
		last = whole.end();
	}
	resolved.push_str(&input[last..]);

	Ok(resolved)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let base_dir = path
			.parent()
			.filter(|p| !p.as_os_str().is_empty())
			.unwrap_or_else(|| Path::new("."));
		let file_name = path.file_name().ok_or_else(|| {
			ConfigError::Validation(format!("Invalid path: {}", path.display()))
		})?;

		let mut loader = loader::ConfigLoader::new(base_dir);
		loader.load_config(file_name).await
	}

	/// Request timeout as a duration.
	pub fn request_timeout(&self) -> std::time::Duration {
		std::time::Duration::from_secs(self.api.timeout_seconds)
	}

	/// Search debounce window as a duration.
	pub fn debounce(&self) -> std::time::Duration {
		std::time::Duration::from_millis(self.search.debounce_ms)
	}

	/// Validates the configuration:
	/// - desk id is not empty
	/// - API base URL is an http(s) URL and the timeout is positive
	/// - pricing fees are non-negative
	/// - the primary storage implementation is configured
	fn validate(&self) -> Result<(), ConfigError> {
		if self.desk.id.trim().is_empty() {
			return Err(ConfigError::Validation("Desk ID cannot be empty".into()));
		}

		let base_url = self.api.base_url.trim();
		if base_url.is_empty() {
			return Err(ConfigError::Validation("API base_url cannot be empty".into()));
		}
		if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
			return Err(ConfigError::Validation(format!(
				"API base_url must start with http:// or https://, got '{}'",
				base_url
			)));
		}
		if self.api.timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"API timeout_seconds must be greater than zero".into(),
			));
		}

		if self.pricing.base_fee < Decimal::ZERO || self.pricing.extra_product_fee < Decimal::ZERO
		{
			return Err(ConfigError::Validation(
				"Pricing fees cannot be negative".into(),
			));
		}

		if self.storage.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one storage implementation must be configured".into(),
			));
		}
		if !self
			.storage
			.implementations
			.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary storage '{}' is not among the configured implementations",
				self.storage.primary
			)));
		}

		Ok(())
	}
}

/// Parses, resolves environment variables and validates a TOML string.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const MINIMAL: &str = r#"
[desk]
id = "desk-test"

[api]
base_url = "http://localhost:4000/api"

[storage]
primary = "memory"
[storage.implementations.memory]
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("DESK_TEST_HOST", "backend.local");
		std::env::set_var("DESK_TEST_PORT", "8443");

		let input = "url = \"https://${DESK_TEST_HOST}:${DESK_TEST_PORT}/api\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "url = \"https://backend.local:8443/api\"");

		std::env::remove_var("DESK_TEST_HOST");
		std::env::remove_var("DESK_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "timeout = ${DESK_UNSET_TIMEOUT:-45}";
		assert_eq!(resolve_env_vars(input).unwrap(), "timeout = 45");
	}

	#[test]
	fn test_missing_env_var_error() {
		let err = resolve_env_vars("token = \"${DESK_MISSING_TOKEN}\"").unwrap_err();
		assert!(err.to_string().contains("DESK_MISSING_TOKEN"));
	}

	#[test]
	fn test_defaults_applied() {
		let config = Config::from_str(MINIMAL).unwrap();
		assert_eq!(config.desk.role, Role::Admin);
		assert_eq!(config.api.timeout_seconds, 30);
		assert_eq!(config.search.debounce_ms, 300);
		assert_eq!(config.pricing, PricingRules::default());
		assert_eq!(config.pricing.base_fee, Decimal::from(45));
		assert_eq!(config.storage.cleanup_interval_seconds, 3600);
	}

	#[test]
	fn test_pricing_override() {
		let config_str = format!(
			"{}\n[pricing]\nbase_fee = \"50.5\"\nincluded_products = 4\n",
			MINIMAL
		);
		let config = Config::from_str(&config_str).unwrap();
		assert_eq!(config.pricing.base_fee, Decimal::new(505, 1));
		assert_eq!(config.pricing.extra_product_fee, Decimal::from(15));
		assert_eq!(config.pricing.included_products, 4);
	}

	#[test]
	fn test_invalid_base_url_rejected() {
		let config_str = MINIMAL.replace("http://localhost:4000/api", "localhost:4000");
		let err = Config::from_str(&config_str).unwrap_err();
		assert!(err.to_string().contains("base_url"));
	}

	#[test]
	fn test_unknown_primary_storage_rejected() {
		let config_str = MINIMAL.replace("primary = \"memory\"", "primary = \"file\"");
		let err = Config::from_str(&config_str).unwrap_err();
		assert!(err.to_string().contains("Primary storage 'file'"));
	}

	#[test]
	fn test_negative_fee_rejected() {
		let config_str = format!("{}\n[pricing]\nextra_product_fee = -1\n", MINIMAL);
		assert!(matches!(
			Config::from_str(&config_str),
			Err(ConfigError::Validation(_))
		));
	}

	#[test]
	fn test_role_from_config() {
		let config_str = MINIMAL.replace("id = \"desk-test\"", "id = \"desk-test\"\nrole = \"super_admin\"");
		let config = Config::from_str(&config_str).unwrap();
		assert_eq!(config.desk.role, Role::SuperAdmin);
	}
}
