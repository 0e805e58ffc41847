//! Test-declared intent, as attached by the host test runner.

/// The `idempotent` marker on a test or test group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
	/// `idempotent` / `idempotent(enabled = true)`: run the test as a pair.
	Enabled,
	/// `idempotent(enabled = false)`: opt out of checking and enforcement.
	Disabled,
}

impl Marker {
	/// Builds a marker from an optional `enabled` argument (absent means enabled).
	pub const fn from_enabled(enabled: Option<bool>) -> Self {
		match enabled {
			Some(false) => Self::Disabled,
			_ => Self::Enabled,
		}
	}
}

/// Metadata the host runner attaches to one logical test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestMeta {
	/// Logical test name, without any variant suffix.
	pub name: String,
	/// Closest `idempotent` marker, if any.
	pub marker: Option<Marker>,
	/// Per-test enforcement override.
	pub enforce: Option<bool>,
	/// Whether the retired `test_idempotency` marker was found.
	pub legacy_marker: bool,
}

impl TestMeta {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			marker: None,
			enforce: None,
			legacy_marker: false,
		}
	}

	pub fn with_marker(mut self, marker: Marker) -> Self {
		self.marker = Some(marker);
		self
	}

	pub fn with_enforce(mut self, enforce: bool) -> Self {
		self.enforce = Some(enforce);
		self
	}

	pub fn with_legacy_marker(mut self) -> Self {
		self.legacy_marker = true;
		self
	}

	/// Applies a marker declared on an enclosing group. The test's own marker
	/// is closer and wins.
	pub fn inherit(mut self, group: Option<Marker>) -> Self {
		self.marker = self.marker.or(group);
		self
	}

	/// Answers the marker questions the protocol asks about this test.
	pub fn query(&self) -> MarkerQuery {
		MarkerQuery {
			present: self.marker.is_some(),
			disabled: self.marker == Some(Marker::Disabled),
			enforce: self.enforce,
		}
	}
}

/// Read-only view of a test's declared idempotency intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MarkerQuery {
	/// An `idempotent` marker applies to the test.
	pub present: bool,
	/// The applicable marker opts the test out.
	pub disabled: bool,
	/// Per-test enforcement override.
	pub enforce: Option<bool>,
}

impl MarkerQuery {
	/// The test participates in paired execution.
	pub const fn is_checked(&self) -> bool {
		self.present && !self.disabled
	}
}
