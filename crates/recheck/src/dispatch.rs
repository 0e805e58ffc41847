//! Process-wide slot deciding what `#[idempotent]` functions do when called.
//!
//! Empty means passthrough: every idempotent function runs exactly once. A
//! session fills the slot for its lifetime through [`InstallGuard`].

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::error::SessionError;
use crate::session::SessionShared;

static INSTALLED: ArcSwapOption<SessionShared> = ArcSwapOption::const_empty();

/// Returns the installed session, if any.
pub(crate) fn installed() -> Option<Arc<SessionShared>> {
	INSTALLED.load_full()
}

pub(crate) fn install(shared: &Arc<SessionShared>) -> Result<InstallGuard, SessionError> {
	let prev = INSTALLED.compare_and_swap(&None::<Arc<SessionShared>>, Some(shared.clone()));
	if prev.is_some() {
		return Err(SessionError::AlreadyInstalled);
	}
	tracing::debug!("recheck session installed");
	Ok(InstallGuard { shared: shared.clone() })
}

/// Whether any session is currently installed in this process.
pub fn is_installed() -> bool {
	INSTALLED.load().is_some()
}

/// Keeps a session installed; dropping it restores passthrough.
#[must_use = "dropping the guard uninstalls the session immediately"]
pub struct InstallGuard {
	shared: Arc<SessionShared>,
}

impl Drop for InstallGuard {
	fn drop(&mut self) {
		let current = Some(self.shared.clone());
		let prev = INSTALLED.compare_and_swap(&current, None::<Arc<SessionShared>>);
		if let Some(prev) = &*prev
			&& Arc::ptr_eq(prev, &self.shared)
		{
			tracing::debug!("recheck session uninstalled");
		}
	}
}
