//! Helpers playing the host runner in unit tests.

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::marker::{Marker, TestMeta};
use crate::report::{RunReport, StartDecision};
use crate::schedule::ScheduledRun;
use crate::session::Session;

pub(crate) fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Schedules a marked test and returns its `[plain, recheck]` runs.
pub(crate) fn paired(session: &Session, name: &str) -> [ScheduledRun; 2] {
	let runs = session.schedule(&TestMeta::new(name).with_marker(Marker::Enabled)).unwrap();
	runs.try_into().unwrap()
}

/// Starts `run`, executes `body` like a runner would, and completes it.
///
/// Panics if the session asks for the run to be skipped.
pub(crate) fn execute(session: &Session, run: &ScheduledRun, body: impl FnOnce()) -> RunReport {
	assert_eq!(session.on_run_start(run), StartDecision::Run, "run `{}` was skipped", run.id);
	let failed = catch_unwind(AssertUnwindSafe(body)).is_err();
	session.on_run_complete(run, failed).unwrap()
}
