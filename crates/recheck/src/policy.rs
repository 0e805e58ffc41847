//! Marker enforcement policy for callers of idempotent functions.

use crate::error::IdempotencyError;
use crate::marker::MarkerQuery;

/// Per-function enforcement override, fixed when the function is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnforcementMode {
	/// Defer to the test and session policy.
	#[default]
	Default,
	/// Always require the marker.
	ForceOn,
	/// Never require the marker.
	ForceOff,
}

/// How a missing marker is treated for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enforcement {
	/// Fail the run with [`IdempotencyError::MissingMarker`].
	Strict,
	/// Warn and continue.
	Lenient,
	/// Say nothing.
	Ignore,
}

impl Enforcement {
	const fn from_flag(enforce: bool) -> Self {
		if enforce { Self::Strict } else { Self::Lenient }
	}
}

/// Host-supplied answer to "is enforcement strict by default for this run".
///
/// Consulted once per resolution, so a host may change its answer over time.
pub trait EnforcementSource: Send + Sync {
	fn enforce_tests(&self) -> Option<bool>;
}

impl<F> EnforcementSource for F
where
	F: Fn() -> Option<bool> + Send + Sync,
{
	fn enforce_tests(&self) -> Option<bool> {
		self()
	}
}

/// Resolves the enforcement level, highest precedence first: function
/// override, per-test override, host policy, session configuration, strict.
pub fn resolve(mode: EnforcementMode, marker: MarkerQuery, host: Option<bool>, configured: Option<bool>) -> Enforcement {
	match mode {
		EnforcementMode::ForceOff => return Enforcement::Ignore,
		EnforcementMode::ForceOn => return Enforcement::Strict,
		EnforcementMode::Default => {}
	}
	marker
		.enforce
		.or(host)
		.or(configured)
		.map_or(Enforcement::Strict, Enforcement::from_flag)
}

/// Outcome of checking a call against the active test's marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerDecision {
	Proceed,
	ProceedWithWarning(IdempotencyError),
	Deny(IdempotencyError),
}

/// Decides what a call from a test with `marker` does under `enforcement`.
///
/// Tests that carry the marker, enabled or disabled, always proceed.
pub fn decide_missing_marker(enforcement: Enforcement, marker: MarkerQuery, function: &'static str, test: &str) -> MarkerDecision {
	if marker.present {
		return MarkerDecision::Proceed;
	}
	let error = || IdempotencyError::MissingMarker {
		function,
		test: test.to_owned(),
	};
	match enforcement {
		Enforcement::Strict => MarkerDecision::Deny(error()),
		Enforcement::Lenient => MarkerDecision::ProceedWithWarning(error()),
		Enforcement::Ignore => MarkerDecision::Proceed,
	}
}
