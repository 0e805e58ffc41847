//! Procedural macros for recheck.
//!
//! Provides the `#[idempotent]` attribute, the definition-time marker that
//! routes a function through the paired-run idempotency protocol.

use proc_macro::TokenStream;

/// Idempotent attribute implementation.
mod idempotent;

/// Marks a function as idempotent.
///
/// Outside an installed `recheck::Session` the function behaves exactly as
/// written. Inside a session, calls made during a recheck run invoke the body
/// a second time with the same arguments.
///
/// ```ignore
/// #[idempotent]
/// fn ensure_seeded(x: &mut Vec<i32>) {
///     if x.is_empty() {
///         x.push(9);
///     }
/// }
///
/// #[idempotent(equal_return)]
/// fn normalize(path: &str) -> String { ... }
///
/// #[idempotent(raises = "already_applied")]
/// fn apply(db: &mut Db) -> Result<(), DbError> { ... }
/// ```
///
/// # Attributes
///
/// - `equal_return` / `equal_return = bool` - Both invocations must return equal values
/// - `enforce_tests = bool` - Force marker enforcement on (`true`) or off (`false`) for this function
/// - `raises = "kind"` - The repeat invocation is expected to fail with this error kind
/// - `crate = path` - Path the generated code uses to reach the runtime (default `::recheck`)
///
/// By-value parameters, including a by-value `self`, are cloned for each invocation, so they
/// must implement `Clone`.
/// Reference parameters are reborrowed.
#[proc_macro_attribute]
pub fn idempotent(attr: TokenStream, item: TokenStream) -> TokenStream {
	idempotent::idempotent(attr, item)
}
