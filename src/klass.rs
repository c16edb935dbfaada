//! Class binder front-end.

use std::fmt;
use std::rc::{Rc, Weak};

use squall_core::{CallContext, NativeError, NativeFn, ObjectRef, RegistryError, TypeKey};
use squall_registry::{ErasedEntry, RegistryEntry, defun};
use squall_vm::VmHandle;

use crate::Vm;

type Entry<C> = RegistryEntry<VmHandle, C>;

/// Binds native type `C` as a class in a [`Vm`].
///
/// Construction registers `C` (reusing an existing registration if there is
/// one). Methods bound with [`func`](Klass::func) land on the class object
/// immediately; the class becomes visible in the root table when the binder
/// is dropped or [`finish`](Klass::finish)ed.
///
/// The binder only observes the registry entry and never keeps it alive; if
/// the `Vm` is dropped first, binding fails with
/// [`RegistryError::ExpiredEntry`] and dropping the binder does nothing.
///
/// ```
/// use squall::prelude::*;
///
/// struct Shape;
/// struct Square;
///
/// let vm = Vm::new();
/// Klass::<Shape>::new(&vm, "Shape")?.func("sides", |ctx| {
///     ctx.set_return(0i64);
///     Ok(())
/// })?;
/// Klass::<Square>::with_base::<Shape>(&vm, "Square")?;
///
/// assert_eq!(vm.call("Square", "sides", &[])?, Dynamic::Int(0));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Klass<C: 'static> {
    runtime: VmHandle,
    key: TypeKey,
    entry: Weak<Entry<C>>,
}

impl<C: 'static> Klass<C> {
    /// Bind `C` as a root class named `name`.
    pub fn new(vm: &Vm, name: &str) -> Result<Self, RegistryError> {
        let entry = vm.register_type::<C>(name, None)?;
        Ok(Self::from_entry(vm, entry))
    }

    /// Bind `C` as a class named `name` deriving from the class of `B`.
    ///
    /// `B` must already be registered.
    pub fn with_base<B: 'static>(vm: &Vm, name: &str) -> Result<Self, RegistryError> {
        let entry = vm.register_type::<C>(name, Some(TypeKey::of::<B>()))?;
        Ok(Self::from_entry(vm, entry))
    }

    fn from_entry(vm: &Vm, entry: Weak<Entry<C>>) -> Self {
        Self {
            runtime: vm.handle().clone(),
            key: TypeKey::of::<C>(),
            entry,
        }
    }

    fn entry(&self) -> Result<Rc<Entry<C>>, RegistryError> {
        self.entry
            .upgrade()
            .ok_or(RegistryError::ExpiredEntry { key: self.key })
    }

    /// Bind a native closure as method `name`.
    pub fn func<F>(&mut self, name: &str, f: F) -> Result<&mut Self, RegistryError>
    where
        F: Fn(&mut CallContext<'_>) -> Result<(), NativeError> + 'static,
    {
        self.native(name, NativeFn::new(f))
    }

    /// Bind an already wrapped native function as method `name`.
    pub fn native(&mut self, name: &str, func: NativeFn) -> Result<&mut Self, RegistryError> {
        let entry = self.entry()?;
        defun::defun_local(&self.runtime, entry.class_object(), name, func)?;
        Ok(self)
    }

    /// The class object, published or not.
    pub fn class_object(&self) -> Result<ObjectRef, RegistryError> {
        Ok(self.entry()?.class_object())
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Publish now and report any failure.
    pub fn finish(self) -> Result<(), RegistryError> {
        self.entry()?.publish()
    }
}

impl<C: 'static> Drop for Klass<C> {
    fn drop(&mut self) {
        let Some(entry) = self.entry.upgrade() else {
            return;
        };
        if let Err(err) = entry.publish() {
            tracing::warn!(key = %self.key, name = entry.name(), %err, "failed to publish class");
        }
    }
}

impl<C: 'static> fmt::Debug for Klass<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Klass")
            .field("key", &self.key)
            .field("type", &std::any::type_name::<C>())
            .field("live", &(self.entry.strong_count() > 0))
            .finish()
    }
}
