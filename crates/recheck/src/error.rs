//! Error types for the paired-run protocol.

use std::path::PathBuf;

use thiserror::Error;

use crate::registry::PairKey;

/// Failures detected by the call interceptor.
///
/// These surface as test failures: the interceptor records the error on the
/// active run and then panics with its message. The panic payload is a plain
/// string; hosts read the structured error from [`RunReport::errors`] (and
/// [`RunReport::fatal`]) after [`Session::on_run_complete`].
///
/// [`RunReport::errors`]: crate::RunReport::errors
/// [`RunReport::fatal`]: crate::RunReport::fatal
/// [`Session::on_run_complete`]: crate::Session::on_run_complete
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdempotencyError {
	/// An enforced idempotent function was called by a test without the marker.
	#[error(
		"test `{test}` calls the idempotent function `{function}` but does not carry the idempotent marker; \
		 add the marker, or mark it disabled to skip idempotency checking"
	)]
	MissingMarker {
		/// Identity of the called function.
		function: &'static str,
		/// Run identifier of the offending test.
		test: String,
	},

	/// The two invocations of an `equal_return` function disagreed.
	#[error("return values of idempotent function `{function}` must be equal: first={first} second={second}")]
	ReturnValuesNotEqual {
		/// Identity of the called function.
		function: &'static str,
		/// Debug rendering of the first result.
		first: String,
		/// Debug rendering of the second result.
		second: String,
	},

	/// The repeat invocation did not fail the way the function declared.
	#[error("idempotent function `{function}` expected error kind `{expected}` on repeat, but {actual}")]
	UnexpectedException {
		/// Identity of the called function.
		function: &'static str,
		/// Declared error kind.
		expected: &'static str,
		/// What happened instead.
		actual: String,
	},
}

impl IdempotencyError {
	/// Whether this error must fail the run even if the test body suppressed it.
	pub fn is_fatal(&self) -> bool {
		matches!(self, Self::MissingMarker { .. })
	}
}

/// Write-once violations in the run registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
	#[error("plain run outcome already recorded for `{0}`")]
	AlreadyRecorded(PairKey),
}

/// Lifecycle misuse by the host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
	#[error("another recheck session is already installed in this process")]
	AlreadyInstalled,

	#[error("test `{0}` uses the retired `test_idempotency` marker; use the `idempotent` marker instead")]
	LegacyMarker(String),

	#[error("no active run on this thread")]
	NoActiveRun,

	#[error("run `{expected}` completed while `{actual}` was active")]
	RunMismatch { expected: String, actual: String },
}

/// Errors that can occur when loading session configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or shape.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// An environment override held an unrecognized value.
	#[error("invalid value for {key}: {value:?}")]
	InvalidValue { key: &'static str, value: String },
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
