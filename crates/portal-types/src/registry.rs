//! Registry trait for self-registering implementations.

/// Base trait for implementation registries.
///
/// Each implementation module (storage, identity, policy, image engine)
/// exposes a `Registry` struct implementing this trait, so that the name used
/// in configuration and the factory that builds it live side by side.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation,
	/// e.g. "memory" for `storage.implementations.memory`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
