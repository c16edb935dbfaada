//! Binding native closures onto class objects.

use squall_core::{NativeFn, ObjectRef, Runtime, RuntimeError, StackGuard};

/// Bind `func` as the member `name` of `class`.
///
/// Rebinding an existing name replaces the previous member. The class does
/// not need to be published first.
pub fn defun_local<R: Runtime + ?Sized>(
    runtime: &R,
    class: ObjectRef,
    name: &str,
    func: NativeFn,
) -> Result<(), RuntimeError> {
    let _guard = StackGuard::new(runtime);
    runtime.push_object(class)?;
    runtime.push_string(name)?;
    runtime.push_native_closure(func)?;
    runtime.new_slot(-3)
}
