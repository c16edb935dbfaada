//! Runtime sequences composed from stack primitives.
//!
//! Every function here runs under a [`StackGuard`], so the runtime stack is
//! back at its original depth when the function returns, whether it
//! succeeded or not.

use squall_core::{ObjectRef, Runtime, RuntimeError, StackGuard};

/// Create a class object, optionally deriving from `parent`.
///
/// The returned object carries one reference owned by the caller, who must
/// eventually give it back with [`Runtime::release`].
pub fn create_class<R: Runtime + ?Sized>(
    runtime: &R,
    parent: Option<ObjectRef>,
) -> Result<ObjectRef, RuntimeError> {
    let _guard = StackGuard::new(runtime);
    if let Some(parent) = parent {
        runtime.push_object(parent)?;
    }
    runtime.new_class(parent.is_some())?;
    let class = runtime.get_stack_object(-1)?;
    runtime.add_ref(class);
    Ok(class)
}

/// Install `value` as the slot `name` of the root table.
pub fn install_global_named_slot<R: Runtime + ?Sized>(
    runtime: &R,
    name: &str,
    value: ObjectRef,
) -> Result<(), RuntimeError> {
    let _guard = StackGuard::new(runtime);
    runtime.push_root_table()?;
    runtime.push_string(name)?;
    runtime.push_object(value)?;
    runtime.new_slot(-3)
}
