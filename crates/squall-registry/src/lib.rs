//! Squall class registry.
//!
//! Maps each native Rust type to exactly one class object inside a runtime,
//! reuses registered parents when deriving, and publishes each class into
//! the runtime's root table at most once.
//!
//! - [`ClassRegistry`]: per-runtime table from [`TypeKey`](squall_core::TypeKey)
//!   to entry
//! - [`RegistryEntry`]: owner of one class object and its publication state
//! - [`ops`]: stack-guarded runtime sequences used by entries
//! - [`defun`]: binding native closures onto class objects

pub mod defun;
mod entry;
pub mod ops;
mod registry;

pub use entry::{ErasedEntry, RegistryEntry};
pub use registry::ClassRegistry;
