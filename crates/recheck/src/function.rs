//! Call interceptor for idempotent functions.
//!
//! Every call goes through [`IdempotentFn`]: it marks the active run as having
//! touched an idempotent function, applies marker enforcement, runs the body,
//! and during a recheck run runs the body a second time with the same
//! arguments. The first result is always the one returned, so a function
//! reporting "did I change anything" stays usable.

use std::fmt::Debug;

use tracing::{trace, warn};

use crate::context;
use crate::dispatch;
use crate::error::IdempotencyError;
use crate::policy::{self, EnforcementMode, MarkerDecision};
use crate::report::Warning;

/// Error values that carry a stable kind identifier.
///
/// Used by functions declared with `raises = "kind"`, which are expected to
/// fail with that kind when repeated (for example "already applied").
pub trait ErrorKind {
	fn kind(&self) -> &str;
}

/// Definition-time descriptor of one idempotent function.
///
/// Immutable and `Sync`, so `#[idempotent]` can keep one in a `static`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdempotentFn {
	name: &'static str,
	equal_return: bool,
	enforcement: EnforcementMode,
	expected_error: Option<&'static str>,
}

impl IdempotentFn {
	pub const fn new(name: &'static str) -> Self {
		Self {
			name,
			equal_return: false,
			enforcement: EnforcementMode::Default,
			expected_error: None,
		}
	}

	/// Requires both invocations to return equal values (see [`Self::call_eq`]).
	pub const fn equal_return(mut self, equal_return: bool) -> Self {
		self.equal_return = equal_return;
		self
	}

	pub const fn enforcement(mut self, mode: EnforcementMode) -> Self {
		self.enforcement = mode;
		self
	}

	/// Declares the error kind the repeat invocation must fail with.
	pub const fn raises(mut self, kind: &'static str) -> Self {
		self.expected_error = Some(kind);
		self
	}

	pub const fn name(&self) -> &'static str {
		self.name
	}

	pub const fn expected_error(&self) -> Option<&'static str> {
		self.expected_error
	}

	/// Invokes `f` under the protocol. Return values are not compared.
	///
	/// # Panics
	///
	/// If the descriptor sets `equal_return` or `raises`; those need
	/// [`Self::call_eq`] or [`Self::try_call`] to be checked at all.
	pub fn call<R>(&self, mut f: impl FnMut() -> R) -> R {
		assert!(
			!self.equal_return && self.expected_error.is_none(),
			"idempotent function `{}` declares `equal_return` or `raises`; invoke it through `call_eq` or `try_call`",
			self.name
		);
		let double = self.enter();
		let first = f();
		if double {
			let _second = f();
		}
		first
	}

	/// Like [`Self::call`], but when `equal_return` is set a differing second
	/// result fails the run with [`IdempotencyError::ReturnValuesNotEqual`].
	///
	/// # Panics
	///
	/// If the descriptor sets `raises`, which only [`Self::try_call`] checks.
	pub fn call_eq<R: PartialEq + Debug>(&self, mut f: impl FnMut() -> R) -> R {
		assert!(
			self.expected_error.is_none(),
			"idempotent function `{}` declares `raises`; invoke it through `try_call`",
			self.name
		);
		let double = self.enter();
		let first = f();
		if double {
			let second = f();
			if let Err(error) = self.compare(&first, &second) {
				raise(error);
			}
		}
		first
	}

	/// Invokes a fallible `f` under the protocol.
	///
	/// An error from the first invocation is returned without repeating,
	/// unless it is the declared expected kind. With an expected kind, the
	/// repeat must fail with exactly that kind; anything else fails the run
	/// with [`IdempotencyError::UnexpectedException`]. Without one, an error
	/// from the repeat becomes the call's error.
	///
	/// # Panics
	///
	/// If the descriptor sets `equal_return`, which only [`Self::call_eq`]
	/// checks.
	pub fn try_call<T, E: ErrorKind>(&self, mut f: impl FnMut() -> Result<T, E>) -> Result<T, E> {
		assert!(
			!self.equal_return,
			"idempotent function `{}` declares `equal_return`; invoke it through `call_eq`",
			self.name
		);
		let double = self.enter();
		let first = f();
		let failed_unexpectedly = first.as_ref().err().is_some_and(|e| Some(e.kind()) != self.expected_error);
		if failed_unexpectedly || !double {
			return first;
		}

		let second = f();
		match self.expected_error {
			Some(expected) => {
				if let Err(error) = self.check_repeat(expected, &second) {
					raise(error);
				}
				first
			}
			None => second.and(first),
		}
	}

	/// Steps shared by every entry point, run before the first invocation:
	/// note the call, enforce the marker, and report whether to repeat.
	fn enter(&self) -> bool {
		match self.plan() {
			Ok(double) => double,
			Err(error) => raise(error),
		}
	}

	fn plan(&self) -> Result<bool, IdempotencyError> {
		let Some(session) = dispatch::installed() else {
			return Ok(false);
		};
		let Some((run_id, marker, double_invoke)) = context::with_active(|run| {
			run.saw_idempotent_call = true;
			(run.run_id.clone(), run.marker, run.double_invoke)
		}) else {
			trace!(function = self.name, "no active run; passing through");
			return Ok(false);
		};

		if marker.disabled {
			return Ok(false);
		}

		let enforcement = policy::resolve(self.enforcement, marker, session.host_enforcement(), session.config.enforce_tests);
		match policy::decide_missing_marker(enforcement, marker, self.name, &run_id) {
			MarkerDecision::Proceed => {}
			MarkerDecision::ProceedWithWarning(_) => {
				let warning = Warning::MissingMarker {
					function: self.name,
					test: run_id,
				};
				warn!(function = self.name, "{warning}");
				context::with_active(|run| run.push_warning(warning));
			}
			MarkerDecision::Deny(error) => return Err(error),
		}

		trace!(function = self.name, double_invoke, "idempotent call");
		Ok(double_invoke)
	}

	fn compare<R: PartialEq + Debug>(&self, first: &R, second: &R) -> Result<(), IdempotencyError> {
		if !self.equal_return || first == second {
			return Ok(());
		}
		Err(IdempotencyError::ReturnValuesNotEqual {
			function: self.name,
			first: format!("{first:?}"),
			second: format!("{second:?}"),
		})
	}

	fn check_repeat<T, E: ErrorKind>(&self, expected: &'static str, second: &Result<T, E>) -> Result<(), IdempotencyError> {
		let actual = match second {
			Err(e) if e.kind() == expected => return Ok(()),
			Err(e) => format!("failed with `{}`", e.kind()),
			Ok(_) => "returned normally".to_owned(),
		};
		Err(IdempotencyError::UnexpectedException {
			function: self.name,
			expected,
			actual,
		})
	}
}

/// Fails the current run with `error`.
///
/// The error is recorded on the active run before unwinding; a fatal one
/// keeps the run failed even if the test body catches the panic.
fn raise(error: IdempotencyError) -> ! {
	context::with_active(|run| run.push_error(&error));
	panic!("{error}");
}
