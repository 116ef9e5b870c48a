//! Registry trait for self-registering implementations.
//!
//! Ledger query and account implementations each expose a `Registry` type so
//! the configuration can refer to them by name.

/// Base trait for implementation registries.
pub trait ImplementationRegistry {
	/// Name used in configuration, e.g. `"rest"` for
	/// `[ledger.implementations.rest]` or `"local"` for `[account.implementations.local]`.
	const NAME: &'static str;

	/// Factory function type of the implementation family.
	type Factory;

	/// Returns the factory that builds this implementation from its config section.
	fn factory() -> Self::Factory;
}
