//! A minimal in-process test runner driving a recheck session.

#![allow(dead_code)]

use std::panic::catch_unwind;

use recheck::{Marker, RunReport, ScheduledRun, Session, StartDecision, TestMeta};

/// Pass/fail/skip/warning counts for one suite execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
	pub passed: usize,
	pub failed: usize,
	pub skipped: usize,
	pub warnings: usize,
}

impl Tally {
	pub const fn new(passed: usize, failed: usize, skipped: usize, warnings: usize) -> Self {
		Self {
			passed,
			failed,
			skipped,
			warnings,
		}
	}
}

/// One logical test.
#[derive(Clone)]
pub struct Case {
	pub meta: TestMeta,
	pub body: fn(),
}

impl Case {
	pub fn marked(name: &str, body: fn()) -> Self {
		Self::with(TestMeta::new(name).with_marker(Marker::Enabled), body)
	}

	pub fn unmarked(name: &str, body: fn()) -> Self {
		Self::with(TestMeta::new(name), body)
	}

	pub fn with(meta: TestMeta, body: fn()) -> Self {
		Self { meta, body }
	}
}

/// Run order, for exercising disturbed pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
	Scheduled,
	Reversed,
}

#[derive(Debug, Default)]
pub struct SuiteResult {
	pub tally: Tally,
	pub reports: Vec<RunReport>,
	pub skip_reasons: Vec<String>,
}

/// Installs `session`, schedules and runs `cases`, and tallies the outcomes.
pub fn run_suite(session: &Session, cases: &[Case], order: Order) -> SuiteResult {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
	let _guard = session.install().expect("no other session installed");

	let mut runs: Vec<(ScheduledRun, fn())> = Vec::new();
	for case in cases {
		for run in session.schedule(&case.meta).expect("schedulable test") {
			runs.push((run, case.body));
		}
	}
	if order == Order::Reversed {
		runs.reverse();
	}

	let mut result = SuiteResult::default();
	for (run, body) in runs {
		match session.on_run_start(&run) {
			StartDecision::Skip { reason, warnings } => {
				result.tally.skipped += 1;
				result.tally.warnings += warnings.len();
				result.skip_reasons.push(reason);
			}
			StartDecision::Run => {
				let failed = catch_unwind(body).is_err();
				let report = session.on_run_complete(&run, failed).expect("run was active");
				if report.passed() {
					result.tally.passed += 1;
				} else {
					result.tally.failed += 1;
				}
				result.tally.warnings += report.warnings.len();
				result.reports.push(report);
			}
		}
	}
	result
}
