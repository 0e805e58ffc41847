//! Per-thread execution context for the run currently executing.
//!
//! One context exists per worker thread. A host that runs tests on parallel
//! threads gets isolated contexts for free; calls made from threads a test
//! spawns itself see no active run and pass through unchecked.

use std::cell::RefCell;

use crate::error::IdempotencyError;
use crate::marker::MarkerQuery;
use crate::report::Warning;
use crate::schedule::{ScheduledRun, Variant};

thread_local! {
	static CURRENT: RefCell<Option<ActiveRun>> = const { RefCell::new(None) };
}

/// State of the run executing on this thread.
#[derive(Debug)]
pub(crate) struct ActiveRun {
	pub(crate) run_id: String,
	pub(crate) variant: Variant,
	pub(crate) marker: MarkerQuery,
	/// Fixed for the whole run.
	pub(crate) double_invoke: bool,
	/// Only the interceptor sets this.
	pub(crate) saw_idempotent_call: bool,
	pub(crate) fatal: Option<IdempotencyError>,
	pub(crate) errors: Vec<IdempotencyError>,
	pub(crate) warnings: Vec<Warning>,
}

impl ActiveRun {
	pub(crate) fn new(run: &ScheduledRun, warnings: Vec<Warning>) -> Self {
		Self {
			run_id: run.id.clone(),
			variant: run.variant,
			marker: run.test.query(),
			double_invoke: run.double_invoke(),
			saw_idempotent_call: false,
			fatal: None,
			errors: Vec::new(),
			warnings,
		}
	}

	pub(crate) fn push_warning(&mut self, warning: Warning) {
		if !self.warnings.contains(&warning) {
			self.warnings.push(warning);
		}
	}

	/// Records a protocol failure; fatal ones stick even if the panic is caught.
	pub(crate) fn push_error(&mut self, error: &IdempotencyError) {
		if error.is_fatal() && self.fatal.is_none() {
			self.fatal = Some(error.clone());
		}
		self.errors.push(error.clone());
	}
}

/// Activates `run` on this thread, returning any run left active before it.
pub(crate) fn begin(run: ActiveRun) -> Option<ActiveRun> {
	CURRENT.with(|cell| cell.borrow_mut().replace(run))
}

/// Deactivates and returns the current run.
pub(crate) fn end() -> Option<ActiveRun> {
	CURRENT.with(|cell| cell.borrow_mut().take())
}

/// Runs `f` against the active run, if any.
///
/// `f` must not call back into user code: the context stays borrowed.
pub(crate) fn with_active<R>(f: impl FnOnce(&mut ActiveRun) -> R) -> Option<R> {
	CURRENT.with(|cell| cell.borrow_mut().as_mut().map(f))
}

/// Read-only view of this thread's active run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSnapshot {
	pub run_id: String,
	pub variant: Variant,
	pub double_invoke: bool,
	pub saw_idempotent_call: bool,
}

/// Returns a snapshot of the run active on the calling thread.
pub fn current_run() -> Option<ContextSnapshot> {
	with_active(|run| ContextSnapshot {
		run_id: run.run_id.clone(),
		variant: run.variant,
		double_invoke: run.double_invoke,
		saw_idempotent_call: run.saw_idempotent_call,
	})
}
