//! Scoped stack restoration.

use crate::{Runtime, StackPos};

/// Restores a runtime's value stack to the depth it had on construction.
///
/// Restoration happens in `Drop`, so temporaries pushed inside the guarded
/// scope are discarded on early returns through `?` as well as on success.
///
/// ```ignore
/// let _guard = StackGuard::new(rt);
/// rt.push_root_table()?;
/// rt.push_string("Player")?;
/// // stack returns to its previous depth here
/// ```
pub struct StackGuard<'rt, R: Runtime + ?Sized> {
    runtime: &'rt R,
    saved: StackPos,
}

impl<'rt, R: Runtime + ?Sized> StackGuard<'rt, R> {
    /// Record the current stack position of `runtime`.
    pub fn new(runtime: &'rt R) -> Self {
        Self {
            saved: runtime.stack_top(),
            runtime,
        }
    }

    /// The position that will be restored.
    pub fn saved(&self) -> StackPos {
        self.saved
    }
}

impl<R: Runtime + ?Sized> Drop for StackGuard<'_, R> {
    fn drop(&mut self) {
        self.runtime.set_stack_top(self.saved);
    }
}
