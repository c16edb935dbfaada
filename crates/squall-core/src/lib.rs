//! Squall core crate.
//!
//! Shared vocabulary for the class registry and any runtime that hosts it:
//! type identity keys, object handles, the runtime service trait, native
//! callables, and the error types that flow between them.

mod error;
mod object;
mod stack_guard;
mod type_key;

pub mod convert;
pub mod runtime;

pub use convert::{FromDynamic, IntoDynamic};
pub use error::{NativeError, RegistryError, RuntimeError};
pub use object::{ObjectRef, StackPos};
pub use runtime::{CallContext, Dynamic, NativeCallable, NativeFn, Runtime};
pub use stack_guard::StackGuard;
pub use type_key::{TypeKey, hash_constants};
