//! Runtime service contract and native call plumbing.
//!
//! ## Key Types
//!
//! - [`Runtime`]: Stack-based service a host runtime exposes to the registry
//! - [`Dynamic`]: Value type seen by native callables
//! - [`NativeFn`]: Type-erased callable wrapper
//! - [`CallContext`]: Bridge between the runtime and a native call

mod call_context;
mod dynamic;
mod native_fn;

pub use call_context::CallContext;
pub use dynamic::Dynamic;
pub use native_fn::{NativeCallable, NativeFn};

use crate::{ObjectRef, RuntimeError, StackPos};

/// Services the class registry needs from an embedded runtime.
///
/// The shape follows a classic embedded interpreter API: values are pushed
/// onto a value stack, and operations consume them from the top. Negative
/// stack indices count from the top (`-1` is the topmost value).
///
/// All methods take `&self`. Implementations are single-threaded handles
/// with interior mutability; no locking is expected.
pub trait Runtime {
    /// Current stack depth.
    fn stack_top(&self) -> StackPos;

    /// Truncate (or pad with nulls) the stack to `pos`.
    ///
    /// Values removed this way give up their references.
    fn set_stack_top(&self, pos: StackPos);

    /// Push the global root table.
    fn push_root_table(&self) -> Result<(), RuntimeError>;

    /// Push a string value.
    fn push_string(&self, value: &str) -> Result<(), RuntimeError>;

    /// Push an existing object.
    fn push_object(&self, obj: ObjectRef) -> Result<(), RuntimeError>;

    /// Push a native closure.
    fn push_native_closure(&self, func: NativeFn) -> Result<(), RuntimeError>;

    /// Create a class and push it.
    ///
    /// With `has_base`, the class on top of the stack is popped and becomes
    /// the new class's parent.
    fn new_class(&self, has_base: bool) -> Result<(), RuntimeError>;

    /// Read the object at `index` without touching its reference count.
    fn get_stack_object(&self, index: isize) -> Result<ObjectRef, RuntimeError>;

    /// Pop a key and a value and create a named slot on the table or class
    /// at `index`.
    ///
    /// `index` is resolved before the pops. On error the stack is unchanged.
    fn new_slot(&self, index: isize) -> Result<(), RuntimeError>;

    /// Take one reference on `obj`.
    fn add_ref(&self, obj: ObjectRef);

    /// Give up one reference on `obj`.
    fn release(&self, obj: ObjectRef);
}
