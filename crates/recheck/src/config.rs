//! Session configuration.
//!
//! Loaded from TOML (either a top-level document or a `[recheck]` table in a
//! shared file) and overlaid from `RECHECK_*` environment variables.

use std::path::Path;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Environment variable overriding [`SessionConfig::enforce_tests`].
pub const ENV_ENFORCE_TESTS: &str = "RECHECK_ENFORCE_TESTS";
/// Environment variable overriding [`SessionConfig::out_of_order`].
pub const ENV_OUT_OF_ORDER: &str = "RECHECK_OUT_OF_ORDER";

/// What a recheck run does when its plain run has no registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutOfOrder {
	/// Warn and run the recheck anyway.
	#[default]
	Run,
	/// Warn and skip the recheck.
	Skip,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SessionConfig {
	/// Default marker enforcement; `None` means strict.
	pub enforce_tests: Option<bool>,
	/// Warn when a checked test never calls an idempotent function.
	pub warn_unused_marker: bool,
	pub out_of_order: OutOfOrder,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			enforce_tests: None,
			warn_unused_marker: true,
			out_of_order: OutOfOrder::Run,
		}
	}
}

impl SessionConfig {
	/// Parses a TOML document, preferring a `[recheck]` table when present.
	pub fn from_toml_str(input: &str) -> Result<Self> {
		let mut table: toml::Table = toml::from_str(input)?;
		let section = match table.remove("recheck") {
			Some(toml::Value::Table(section)) => section,
			Some(other) => {
				table.insert("recheck".to_owned(), other);
				table
			}
			None => table,
		};
		Ok(toml::Value::Table(section).try_into()?)
	}

	/// Reads and parses a TOML file.
	pub fn from_path(path: &Path) -> Result<Self> {
		let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&input)
	}

	/// Overlays `RECHECK_*` variables from the process environment.
	pub fn apply_env(self) -> Result<Self> {
		self.apply_env_with(|key| std::env::var(key).ok())
	}

	/// Overlays `RECHECK_*` variables read through `lookup`.
	pub fn apply_env_with(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
		if let Some(value) = lookup(ENV_ENFORCE_TESTS) {
			self.enforce_tests = Some(parse_flag(ENV_ENFORCE_TESTS, &value)?);
		}
		if let Some(value) = lookup(ENV_OUT_OF_ORDER) {
			self.out_of_order = match value.trim().to_lowercase().as_str() {
				"run" => OutOfOrder::Run,
				"skip" => OutOfOrder::Skip,
				_ => {
					return Err(ConfigError::InvalidValue {
						key: ENV_OUT_OF_ORDER,
						value,
					});
				}
			};
		}
		Ok(self)
	}
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool> {
	match value.trim().to_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" => Ok(false),
		_ => Err(ConfigError::InvalidValue {
			key,
			value: value.to_owned(),
		}),
	}
}
