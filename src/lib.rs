//! Squall: expose native Rust types as classes in an embedded script runtime.
//!
//! A [`Vm`] owns a runtime instance together with its one class registry.
//! Native code describes a type with a [`Klass`] binder: the binder registers
//! the type on construction, binds methods with [`Klass::func`], and
//! publishes the class into the runtime's root table when it goes out of
//! scope.
//!
//! ```
//! use squall::prelude::*;
//!
//! struct Counter;
//!
//! let vm = Vm::new();
//! Klass::<Counter>::new(&vm, "Counter")?.func("zero", |ctx| {
//!     ctx.set_return(0i64);
//!     Ok(())
//! })?;
//!
//! assert_eq!(vm.call("Counter", "zero", &[])?, Dynamic::Int(0));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod klass;
mod vm;

pub use klass::Klass;
pub use vm::Vm;

pub use squall_core::{
    CallContext, Dynamic, FromDynamic, IntoDynamic, NativeCallable, NativeError, NativeFn,
    ObjectRef, RegistryError, Runtime, RuntimeError, StackGuard, StackPos, TypeKey,
};
pub use squall_registry::{ClassRegistry, ErasedEntry, RegistryEntry};
pub use squall_vm::{VmConfig, VmHandle, VmProperty};

pub mod prelude {
    pub use crate::klass::Klass;
    pub use crate::vm::Vm;
    pub use squall_core::{
        CallContext, Dynamic, NativeError, ObjectRef, RegistryError, Runtime, RuntimeError,
        TypeKey,
    };
    pub use squall_vm::VmConfig;
}
