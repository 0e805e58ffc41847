//! Paired-run idempotency checking.
//!
//! Functions marked [`idempotent`] are expected to leave no extra observable
//! effect when called a second time with the same arguments. A host test
//! runner drives a [`Session`]: each test carrying the idempotent marker is
//! scheduled twice, once normally and once as a recheck run in which every
//! idempotent function silently runs twice. Accumulation bugs then show up as
//! assertion failures in the recheck run, or as
//! [`IdempotencyError::ReturnValuesNotEqual`] for `equal_return` functions.
//!
//! ```ignore
//! use recheck::idempotent;
//!
//! #[idempotent]
//! fn ensure_seeded(x: &mut Vec<i32>) {
//!     if x.is_empty() {
//!         x.push(9);
//!     }
//! }
//! ```
//!
//! The recheck run is skipped when its plain run failed or never called an
//! idempotent function. Tests that call an idempotent function without the
//! marker fail with [`IdempotencyError::MissingMarker`], unless enforcement is
//! relaxed for the function, the test, or the whole session.
//!
//! # Limitations
//!
//! The execution context is per thread. Idempotent functions called from
//! threads spawned inside a test are not checked.

pub mod config;
mod context;
mod dispatch;
pub mod error;
mod function;
pub mod marker;
pub mod policy;
pub mod registry;
pub mod report;
pub mod schedule;
mod session;
#[cfg(test)]
mod test_support;

pub use config::{OutOfOrder, SessionConfig};
pub use context::{ContextSnapshot, current_run};
pub use dispatch::{InstallGuard, is_installed};
pub use error::{ConfigError, IdempotencyError, RegistryError, SessionError};
pub use function::{ErrorKind, IdempotentFn};
pub use marker::{Marker, MarkerQuery, TestMeta};
pub use policy::{Enforcement, EnforcementMode, EnforcementSource};
pub use recheck_macros::idempotent;
pub use registry::{PairKey, PairState, RunRegistry};
pub use report::{RunOutcome, RunReport, StartDecision, Warning};
pub use schedule::{ScheduledRun, Variant};
pub use session::{Session, SessionBuilder};
