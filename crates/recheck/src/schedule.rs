//! Pairing scheduler: expands one logical test into the runs the host executes.

use crate::error::SessionError;
use crate::marker::TestMeta;
use crate::registry::PairKey;

/// Which execution of a logical test a run is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
	/// Ordinary execution of an unpaired test.
	Single,
	/// First run of a pair, normal mode.
	Plain,
	/// Second run of a pair, with double invocation enabled.
	Recheck,
}

impl Variant {
	/// Suffix appended to the logical name to form the run identifier.
	pub const fn suffix(self) -> Option<&'static str> {
		match self {
			Self::Single => None,
			Self::Plain => Some("[no-idempotency-check]"),
			Self::Recheck => Some("[idempotency-check]"),
		}
	}

	/// Value injected into the execution context for the whole run.
	pub const fn double_invoke(self) -> bool {
		matches!(self, Self::Recheck)
	}

	pub const fn is_paired(self) -> bool {
		!matches!(self, Self::Single)
	}
}

/// One scheduling request handed to the host runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledRun {
	/// Full run identifier, unique per variant.
	pub id: String,
	/// Identity shared by both runs of a pair.
	pub key: PairKey,
	pub variant: Variant,
	/// Metadata of the logical test this run belongs to.
	pub test: TestMeta,
}

impl ScheduledRun {
	fn new(test: &TestMeta, variant: Variant) -> Self {
		let id = match variant.suffix() {
			Some(suffix) => format!("{}{suffix}", test.name),
			None => test.name.clone(),
		};
		Self {
			key: PairKey::from_run_id(&id),
			id,
			variant,
			test: test.clone(),
		}
	}

	pub const fn double_invoke(&self) -> bool {
		self.variant.double_invoke()
	}
}

/// Expands a logical test into its scheduled runs.
///
/// Checked tests yield `[plain, recheck]` in that order; the host must keep
/// the recheck after its plain run for correlation to work. Everything else
/// yields a single ordinary run.
pub fn schedule(test: &TestMeta) -> Result<Vec<ScheduledRun>, SessionError> {
	if test.legacy_marker {
		return Err(SessionError::LegacyMarker(test.name.clone()));
	}
	if test.query().is_checked() {
		Ok(vec![ScheduledRun::new(test, Variant::Plain), ScheduledRun::new(test, Variant::Recheck)])
	} else {
		Ok(vec![ScheduledRun::new(test, Variant::Single)])
	}
}
