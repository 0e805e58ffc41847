//! Correlation between the plain and recheck runs of one logical test.

use std::fmt;

use parking_lot::Mutex;
use rustc_hash::FxHashMap as HashMap;

use crate::error::RegistryError;
use crate::schedule::Variant;

/// Stable identity of one logical test, shared by both of its paired runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey(Box<str>);

impl PairKey {
	/// Builds a key from a logical test name.
	pub fn new(name: impl Into<Box<str>>) -> Self {
		Self(name.into())
	}

	/// Derives the key from a full run identifier by stripping the variant suffix.
	///
	/// Identifiers without a known suffix are their own key.
	pub fn from_run_id(run_id: &str) -> Self {
		for variant in [Variant::Plain, Variant::Recheck] {
			if let Some(stripped) = variant.suffix().and_then(|suffix| run_id.strip_suffix(suffix)) {
				return Self::new(stripped);
			}
		}
		Self::new(run_id)
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for PairKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// What the recheck run learns about its plain run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairState {
	/// No plain outcome recorded; pairing order was disturbed.
	Unknown,
	/// Plain run passed and invoked at least one idempotent function.
	PassedWithIdempotentCall,
	/// Plain run failed, or never invoked an idempotent function.
	FailedOrNoCall,
}

impl PairState {
	/// Classifies a completed plain run.
	pub const fn from_plain_run(failed: bool, saw_idempotent_call: bool) -> Self {
		if !failed && saw_idempotent_call {
			Self::PassedWithIdempotentCall
		} else {
			Self::FailedOrNoCall
		}
	}
}

/// Process-wide write-once map from [`PairKey`] to plain-run outcome.
///
/// Entries are never removed; the registry lives as long as its session.
#[derive(Debug, Default)]
pub struct RunRegistry {
	inner: Mutex<HashMap<PairKey, PairState>>,
}

impl RunRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Records a plain-run outcome. An existing entry is kept and reported.
	pub fn record(&self, key: PairKey, state: PairState) -> Result<(), RegistryError> {
		let mut guard = self.inner.lock();
		if guard.contains_key(&key) {
			return Err(RegistryError::AlreadyRecorded(key));
		}
		guard.insert(key, state);
		Ok(())
	}

	/// Looks up the plain-run outcome for `key`.
	pub fn lookup(&self, key: &PairKey) -> PairState {
		self.inner.lock().get(key).copied().unwrap_or(PairState::Unknown)
	}

	pub fn len(&self) -> usize {
		self.inner.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.lock().is_empty()
	}
}
