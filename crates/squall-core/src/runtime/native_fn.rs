//! Native function storage and callable trait.

use std::fmt;
use std::rc::Rc;

use crate::NativeError;

use super::CallContext;

/// Type-erased native function.
///
/// Wraps any callable implementing [`NativeCallable`] so functions of
/// different shapes can be stored uniformly in runtime slots. Cloning shares
/// the underlying callable.
#[derive(Clone)]
pub struct NativeFn {
    inner: Rc<dyn NativeCallable>,
}

impl NativeFn {
    /// Wrap a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut CallContext<'_>) -> Result<(), NativeError> + 'static,
    {
        Self { inner: Rc::new(f) }
    }

    /// Wrap any [`NativeCallable`] implementation.
    pub fn from_callable<C>(callable: C) -> Self
    where
        C: NativeCallable + 'static,
    {
        Self {
            inner: Rc::new(callable),
        }
    }

    /// Call this native function with the given context.
    pub fn call(&self, ctx: &mut CallContext<'_>) -> Result<(), NativeError> {
        self.inner.call(ctx)
    }

    /// Whether two handles share the same callable.
    pub fn ptr_eq(&self, other: &NativeFn) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for NativeFn {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn").finish_non_exhaustive()
    }
}

/// Trait for callable native functions.
///
/// The `call` method receives a [`CallContext`] giving access to the
/// arguments and the return slot.
pub trait NativeCallable {
    /// Call this function with the given context.
    fn call(&self, ctx: &mut CallContext<'_>) -> Result<(), NativeError>;
}

impl<F> NativeCallable for F
where
    F: Fn(&mut CallContext<'_>) -> Result<(), NativeError>,
{
    fn call(&self, ctx: &mut CallContext<'_>) -> Result<(), NativeError> {
        (self)(ctx)
    }
}
