//! Test session: the hooks a host runner calls around scheduling and running
//! tests.
//!
//! # Host contract
//!
//! 1. [`Session::install`] once, before any test runs.
//! 2. [`Session::schedule`] every logical test; run the returned runs in order
//!    (a recheck run must follow its plain run).
//! 3. Around each run: [`Session::on_run_start`], then, if told to run, execute
//!    the test on the same thread and call [`Session::on_run_complete`].
//!
//! The run registry is shared and synchronized; the execution context is per
//! thread, so a host may drive independent runs on parallel workers.

use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::config::{OutOfOrder, SessionConfig};
use crate::context::{self, ActiveRun};
use crate::dispatch::{self, InstallGuard};
use crate::error::SessionError;
use crate::marker::TestMeta;
use crate::policy::EnforcementSource;
use crate::registry::{PairState, RunRegistry};
use crate::report::{RunOutcome, RunReport, StartDecision, Warning};
use crate::schedule::{self, ScheduledRun, Variant};

/// State shared between the session handle and the installed dispatch slot.
pub(crate) struct SessionShared {
	pub(crate) config: SessionConfig,
	pub(crate) registry: RunRegistry,
	enforcement: Option<Box<dyn EnforcementSource>>,
}

impl SessionShared {
	/// Host answer to the global enforcement question.
	pub(crate) fn host_enforcement(&self) -> Option<bool> {
		self.enforcement.as_ref().and_then(|source| source.enforce_tests())
	}
}

/// Builder for [`Session`].
#[derive(Default)]
pub struct SessionBuilder {
	config: SessionConfig,
	enforcement: Option<Box<dyn EnforcementSource>>,
}

impl SessionBuilder {
	pub fn config(mut self, config: SessionConfig) -> Self {
		self.config = config;
		self
	}

	/// Sets the host-supplied global enforcement policy.
	pub fn enforcement_source(mut self, source: impl EnforcementSource + 'static) -> Self {
		self.enforcement = Some(Box::new(source));
		self
	}

	pub fn build(self) -> Session {
		Session {
			shared: Arc::new(SessionShared {
				config: self.config,
				registry: RunRegistry::new(),
				enforcement: self.enforcement,
			}),
		}
	}
}

/// One test session.
#[derive(Clone)]
pub struct Session {
	shared: Arc<SessionShared>,
}

impl Default for Session {
	fn default() -> Self {
		Self::new(SessionConfig::default())
	}
}

impl Session {
	pub fn new(config: SessionConfig) -> Self {
		Self::builder().config(config).build()
	}

	pub fn builder() -> SessionBuilder {
		SessionBuilder::default()
	}

	pub fn config(&self) -> &SessionConfig {
		&self.shared.config
	}

	pub fn registry(&self) -> &RunRegistry {
		&self.shared.registry
	}

	/// Routes every `#[idempotent]` function in the process through this
	/// session until the guard is dropped.
	pub fn install(&self) -> Result<InstallGuard, SessionError> {
		dispatch::install(&self.shared)
	}

	/// Expands a logical test into the runs the host must execute, in order.
	pub fn schedule(&self, test: &TestMeta) -> Result<Vec<ScheduledRun>, SessionError> {
		let runs = schedule::schedule(test)?;
		trace!(test = %test.name, runs = runs.len(), "scheduled");
		Ok(runs)
	}

	/// Prepares the calling thread for `run`, or tells the host to skip it.
	pub fn on_run_start(&self, run: &ScheduledRun) -> StartDecision {
		let mut warnings = Vec::new();

		if run.variant == Variant::Recheck {
			match self.shared.registry.lookup(&run.key) {
				PairState::PassedWithIdempotentCall => {}
				PairState::FailedOrNoCall => {
					info!(run = %run.id, "skipping recheck: plain run failed or never called an idempotent function");
					return StartDecision::Skip {
						reason: format!(
							"plain run of `{}` failed or never called an idempotent function",
							run.key
						),
						warnings,
					};
				}
				PairState::Unknown => {
					let warning = Warning::OutOfOrderPairing { key: run.key.clone() };
					warn!(run = %run.id, "{warning}");
					warnings.push(warning);
					if self.shared.config.out_of_order == OutOfOrder::Skip {
						return StartDecision::Skip {
							reason: format!("no recorded plain run for `{}`", run.key),
							warnings,
						};
					}
				}
			}
		}

		if !dispatch::is_installed() {
			debug!(run = %run.id, "run started without an installed session; idempotent calls pass through");
		}
		if let Some(stale) = context::begin(ActiveRun::new(run, warnings)) {
			warn!(stale = %stale.run_id, run = %run.id, "previous run was never completed; discarding it");
		}
		trace!(run = %run.id, double_invoke = run.double_invoke(), "run started");
		StartDecision::Run
	}

	/// Finishes `run`: records the plain outcome and collects diagnostics.
	///
	/// `failed` is the host's verdict on the test body. A fatal protocol error
	/// fails the run even if the body suppressed it.
	pub fn on_run_complete(&self, run: &ScheduledRun, failed: bool) -> Result<RunReport, SessionError> {
		let current = context::with_active(|active| active.run_id.clone()).ok_or(SessionError::NoActiveRun)?;
		if current != run.id {
			return Err(SessionError::RunMismatch {
				expected: run.id.clone(),
				actual: current,
			});
		}
		let mut active = context::end().ok_or(SessionError::NoActiveRun)?;

		let failed = failed || active.fatal.is_some();

		if run.variant == Variant::Plain {
			let state = PairState::from_plain_run(failed, active.saw_idempotent_call);
			if let Err(e) = self.shared.registry.record(run.key.clone(), state) {
				warn!(run = %run.id, error = %e, "keeping first recorded plain outcome");
			}
		}

		if active.marker.is_checked() && !active.saw_idempotent_call && self.shared.config.warn_unused_marker {
			let warning = Warning::UnusedMarker { test: run.test.name.clone() };
			warn!(run = %run.id, "{warning}");
			active.push_warning(warning);
		}

		let outcome = if failed { RunOutcome::Failed } else { RunOutcome::Passed };
		debug!(run = %run.id, ?outcome, saw_idempotent_call = active.saw_idempotent_call, "run complete");

		Ok(RunReport {
			run_id: active.run_id,
			outcome,
			fatal: active.fatal,
			errors: active.errors,
			warnings: active.warnings,
		})
	}

	/// Clears `run` from the calling thread without recording anything, for
	/// runs the host aborts or tears down early.
	pub fn on_run_teardown(&self, run: &ScheduledRun) {
		let matches = context::with_active(|active| active.run_id == run.id).unwrap_or(false);
		if matches {
			context::end();
			trace!(run = %run.id, "run torn down");
		}
	}
}
