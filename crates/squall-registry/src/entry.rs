//! Registry entries: one class object per native type.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use squall_core::{ObjectRef, RegistryError, Runtime, TypeKey};

use crate::ops;

/// Type-erased view of a [`RegistryEntry`].
///
/// The registry stores entries for many native types side by side through
/// this trait; callers that know the concrete type recover it with
/// [`ErasedEntry::into_any`] and `Rc::downcast`.
pub trait ErasedEntry<R: Runtime> {
    /// Key the entry was registered under.
    fn key(&self) -> TypeKey;

    /// Name the class is (or will be) published under.
    fn name(&self) -> &str;

    /// Install the class into the root table. No-op once published.
    fn publish(&self) -> Result<(), RegistryError>;

    fn is_published(&self) -> bool;

    /// The runtime class object. Valid for the entry's whole lifetime.
    fn class_object(&self) -> ObjectRef;

    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

/// Owner of the class object bound to native type `T`.
///
/// Holds one runtime reference on the class object from construction until
/// drop. Publication flips from unpublished to published exactly once.
pub struct RegistryEntry<R: Runtime, T: 'static> {
    runtime: R,
    key: TypeKey,
    name: String,
    class_object: ObjectRef,
    published: Cell<bool>,
    _native: PhantomData<fn() -> T>,
}

impl<R: Runtime, T: 'static> RegistryEntry<R, T> {
    /// Create a root class for `T`.
    pub fn new(runtime: R, name: impl Into<String>) -> Result<Self, RegistryError> {
        Self::create(runtime, name.into(), None)
    }

    /// Create a class for `T` deriving from `parent`.
    pub fn with_parent(
        runtime: R,
        name: impl Into<String>,
        parent: ObjectRef,
    ) -> Result<Self, RegistryError> {
        Self::create(runtime, name.into(), Some(parent))
    }

    fn create(runtime: R, name: String, parent: Option<ObjectRef>) -> Result<Self, RegistryError> {
        let class_object = ops::create_class(&runtime, parent)?;
        Ok(Self {
            runtime,
            key: TypeKey::of::<T>(),
            name,
            class_object,
            published: Cell::new(false),
            _native: PhantomData,
        })
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }
}

impl<R: Runtime + 'static, T: 'static> ErasedEntry<R> for RegistryEntry<R, T> {
    fn key(&self) -> TypeKey {
        self.key
    }

    fn name(&self) -> &str {
        &self.name
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    fn publish(&self) -> Result<(), RegistryError> {
        if self.published.get() {
            return Ok(());
        }
        ops::install_global_named_slot(&self.runtime, &self.name, self.class_object)?;
        self.published.set(true);
        tracing::debug!(key = %self.key, name = %self.name, "published class");
        Ok(())
    }

    fn is_published(&self) -> bool {
        self.published.get()
    }

    fn class_object(&self) -> ObjectRef {
        self.class_object
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

impl<R: Runtime, T: 'static> Drop for RegistryEntry<R, T> {
    fn drop(&mut self) {
        self.runtime.release(self.class_object);
    }
}

impl<R: Runtime, T: 'static> fmt::Debug for RegistryEntry<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("class_object", &self.class_object)
            .field("published", &self.published.get())
            .finish_non_exhaustive()
    }
}
