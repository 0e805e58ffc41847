//! What the session hands back to the host at each lifecycle hook.

use std::fmt;

use crate::error::IdempotencyError;
use crate::registry::PairKey;

/// Non-fatal diagnostics, reported alongside the run outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
	/// A recheck run started before its plain run was recorded.
	OutOfOrderPairing { key: PairKey },
	/// A checked test never called an idempotent function.
	UnusedMarker { test: String },
	/// An unmarked test called an idempotent function under lenient enforcement.
	MissingMarker { function: &'static str, test: String },
}

impl fmt::Display for Warning {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::OutOfOrderPairing { key } => write!(
				f,
				"recheck run for `{key}` started before its plain run was recorded; \
				 test ordering was changed, running best-effort"
			),
			Self::UnusedMarker { test } => write!(
				f,
				"test `{test}` is marked idempotent but never calls an idempotent function; \
				 remove the marker to avoid running it twice"
			),
			Self::MissingMarker { function, test } => write!(
				f,
				"test `{test}` calls the idempotent function `{function}` without the idempotent marker"
			),
		}
	}
}

/// Host instruction returned when a run is about to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartDecision {
	/// Execute the run, then call `on_run_complete`.
	Run,
	/// Report the run as skipped without executing it.
	Skip { reason: String, warnings: Vec<Warning> },
}

impl StartDecision {
	pub const fn is_skip(&self) -> bool {
		matches!(self, Self::Skip { .. })
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
	Passed,
	Failed,
}

/// Final verdict for one executed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
	pub run_id: String,
	pub outcome: RunOutcome,
	/// Error that failed the run regardless of what the test body did.
	pub fatal: Option<IdempotencyError>,
	/// Every protocol failure raised during the run, in order.
	pub errors: Vec<IdempotencyError>,
	pub warnings: Vec<Warning>,
}

impl RunReport {
	pub fn passed(&self) -> bool {
		self.outcome == RunOutcome::Passed
	}
}
