//! Loader for configurations split across several files.
//!
//! The entry file may list other files under `include`. Included files are
//! merged section by section; a section defined twice is an error, and so is
//! a file included twice.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Loads an entry file and the files it includes.
pub struct ConfigLoader {
	/// Directory relative includes are resolved against
	base_path: PathBuf,
	/// Canonical paths already read, for cycle detection
	visited: HashSet<PathBuf>,
	/// File that defined each top-level section
	owners: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	pub fn new(base_path: impl AsRef<Path>) -> Self {
		Self {
			base_path: base_path.as_ref().to_path_buf(),
			visited: HashSet::new(),
			owners: HashMap::new(),
		}
	}

	/// Loads, merges and validates the configuration rooted at `entry`.
	pub async fn load_config(&mut self, entry: impl AsRef<Path>) -> Result<Config, ConfigError> {
		let entry_path = self.resolve_path(entry)?;
		let entry_text = self.read_resolved(&entry_path).await?;
		let mut root: toml::Value = toml::from_str(&entry_text)?;

		let includes = Self::take_includes(&mut root)?;
		if includes.is_empty() {
			return entry_text.parse();
		}

		self.claim_sections(&root, &entry_path)?;
		for include in includes {
			let include_path = self.resolve_path(&include)?;
			tracing::debug!(file = %include_path.display(), "Including configuration file");
			let text = self.read_resolved(&include_path).await?;
			let value: toml::Value = toml::from_str(&text)?;
			self.claim_sections(&value, &include_path)?;

			if let (Some(target), Some(source)) = (root.as_table_mut(), value.as_table()) {
				for (section, body) in source {
					target.insert(section.clone(), body.clone());
				}
			}
		}

		let merged = toml::to_string(&root).map_err(|e| {
			ConfigError::Parse(format!("Failed to serialize merged config: {}", e))
		})?;
		merged.parse()
	}

	/// Reads a file once and substitutes environment variables.
	async fn read_resolved(&mut self, path: &Path) -> Result<String, ConfigError> {
		let canonical = path.canonicalize().map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Cannot resolve path {}: {}", path.display(), e),
			))
		})?;

		if !self.visited.insert(canonical.clone()) {
			return Err(ConfigError::Validation(format!(
				"Circular include detected: {} was already loaded",
				canonical.display()
			)));
		}

		let text = tokio::fs::read_to_string(path).await?;
		resolve_env_vars(&text)
	}

	/// Removes the `include` key and returns the listed paths.
	fn take_includes(root: &mut toml::Value) -> Result<Vec<PathBuf>, ConfigError> {
		let Some(raw) = root.as_table_mut().and_then(|t| t.remove("include")) else {
			return Ok(Vec::new());
		};

		match raw {
			toml::Value::String(path) => Ok(vec![PathBuf::from(path)]),
			toml::Value::Array(items) => items
				.into_iter()
				.map(|item| match item {
					toml::Value::String(path) => Ok(PathBuf::from(path)),
					_ => Err(ConfigError::Validation(
						"Include array must contain only strings".into(),
					)),
				})
				.collect(),
			_ => Err(ConfigError::Validation(
				"Include must be a string or array of strings".into(),
			)),
		}
	}

	/// Records the sections of a file, failing on a section seen before.
	fn claim_sections(&mut self, value: &toml::Value, source: &Path) -> Result<(), ConfigError> {
		let Some(table) = value.as_table() else {
			return Ok(());
		};

		for section in table.keys() {
			if let Some(owner) = self.owners.get(section) {
				return Err(ConfigError::Validation(format!(
					"Duplicate section '{}' found in {} and {}. \
					Each top-level section must be unique across all configuration files.",
					section,
					owner.display(),
					source.display()
				)));
			}
			self.owners.insert(section.clone(), source.to_path_buf());
		}
		Ok(())
	}

	/// Resolves a path relative to the base directory and checks it exists.
	fn resolve_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
		let path = path.as_ref();
		let resolved = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.base_path.join(path)
		};

		if !resolved.exists() {
			return Err(ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Configuration file not found: {}", resolved.display()),
			)));
		}
		Ok(resolved)
	}
}
