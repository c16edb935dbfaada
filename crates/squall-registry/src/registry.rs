//! ClassRegistry - per-runtime table of native class bindings.
//!
//! # Storage Model
//!
//! Entries are keyed by [`TypeKey`], so every binding site that names the
//! same native type lands on the same entry, whichever order they run in.
//! The registry holds the only strong reference to each entry; callers get
//! [`Weak`] handles that expire when the registry is cleared or dropped.
//!
//! # Parent Resolution
//!
//! A derived type's parent must already be registered. The registry does not
//! create parents on demand; registering `Derived` before `Base` fails with
//! [`RegistryError::MissingParent`].
//!
//! # Thread Safety
//!
//! Not thread-safe. A registry belongs to one runtime and is only touched
//! from the thread that owns it.
//!
//! # Example
//!
//! ```
//! use squall_core::TypeKey;
//! use squall_registry::ClassRegistry;
//! use squall_vm::VmHandle;
//!
//! struct Shape;
//! struct Circle;
//!
//! let vm = VmHandle::default();
//! let mut registry = ClassRegistry::new(vm.clone());
//!
//! registry.register_type::<Shape>("Shape", None).unwrap();
//! registry
//!     .register_type::<Circle>("Circle", Some(TypeKey::of::<Shape>()))
//!     .unwrap();
//!
//! let circle = registry.find_and_publish(TypeKey::of::<Circle>()).unwrap();
//! assert!(circle.is_some());
//! assert!(vm.global("Circle").is_some());
//! ```

use std::fmt;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use squall_core::{ObjectRef, RegistryError, Runtime, TypeKey};

use crate::{ErasedEntry, RegistryEntry};

/// Per-runtime mapping from native type to class entry.
pub struct ClassRegistry<R: Runtime + Clone + 'static> {
    runtime: R,
    entries: FxHashMap<TypeKey, Rc<dyn ErasedEntry<R>>>,
}

impl<R: Runtime + Clone + 'static> ClassRegistry<R> {
    /// Create an empty registry bound to `runtime`.
    pub fn new(runtime: R) -> Self {
        Self {
            runtime,
            entries: FxHashMap::default(),
        }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Register native type `T`, or return its existing entry.
    ///
    /// On first registration a class object is created, deriving from the
    /// class of `parent` when given. If `T` is already registered the
    /// existing entry is returned and `name` and `parent` are ignored.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn register_type<T: 'static>(
        &mut self,
        name: &str,
        parent: Option<TypeKey>,
    ) -> Result<Weak<RegistryEntry<R, T>>, RegistryError> {
        let key = TypeKey::of::<T>();

        if let Some(existing) = self.entries.get(&key) {
            tracing::debug!(%key, name, existing = existing.name(), "type already registered");
            return Rc::clone(existing)
                .into_any()
                .downcast::<RegistryEntry<R, T>>()
                .map(|entry| Rc::downgrade(&entry))
                .map_err(|_| RegistryError::KeyCollision { key });
        }

        let entry = match parent {
            Some(parent_key) => {
                let parent_class = self
                    .entries
                    .get(&parent_key)
                    .map(|p| p.class_object())
                    .ok_or(RegistryError::MissingParent {
                        key,
                        parent: parent_key,
                    })?;
                RegistryEntry::<R, T>::with_parent(self.runtime.clone(), name, parent_class)?
            }
            None => RegistryEntry::<R, T>::new(self.runtime.clone(), name)?,
        };

        let entry = Rc::new(entry);
        let weak = Rc::downgrade(&entry);
        self.entries.insert(key, entry);
        tracing::debug!(%key, name, parent = ?parent, "registered type");
        Ok(weak)
    }

    /// Register `T` as a root class.
    pub fn register_root<T: 'static>(
        &mut self,
        name: &str,
    ) -> Result<Weak<RegistryEntry<R, T>>, RegistryError> {
        self.register_type::<T>(name, None)
    }

    /// Register `T` deriving from the already registered `B`.
    pub fn register_derived<T: 'static, B: 'static>(
        &mut self,
        name: &str,
    ) -> Result<Weak<RegistryEntry<R, T>>, RegistryError> {
        self.register_type::<T>(name, Some(TypeKey::of::<B>()))
    }

    /// Publish the entry for `key` and return its class object.
    ///
    /// Returns `Ok(None)` when nothing is registered under `key`.
    pub fn find_and_publish(&self, key: TypeKey) -> Result<Option<ObjectRef>, RegistryError> {
        let Some(entry) = self.entries.get(&key) else {
            return Ok(None);
        };
        entry.publish()?;
        Ok(Some(entry.class_object()))
    }

    /// Weak handle to the entry for `key`.
    pub fn entry(&self, key: TypeKey) -> Option<Weak<dyn ErasedEntry<R>>> {
        self.entries.get(&key).map(Rc::downgrade)
    }

    pub fn contains(&self, key: TypeKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry, releasing the class objects they hold.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            tracing::debug!(count = self.entries.len(), "tearing down class registry");
        }
        self.entries.clear();
    }
}

impl<R: Runtime + Clone + 'static> fmt::Debug for ClassRegistry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use squall_core::{Dynamic, RuntimeError, StackPos};
    use squall_vm::{VmConfig, VmHandle};

    use super::*;

    struct Animal;
    struct Dog;
    struct Puppy;

    fn registry() -> (VmHandle, ClassRegistry<VmHandle>) {
        let vm = VmHandle::default();
        let registry = ClassRegistry::new(vm.clone());
        (vm, registry)
    }

    #[test]
    fn new_registry_is_empty() {
        let (_, registry) = registry();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn register_root_type() {
        let (vm, mut registry) = registry();
        let weak = registry.register_root::<Animal>("Animal").unwrap();
        let entry = weak.upgrade().unwrap();

        assert!(registry.contains(TypeKey::of::<Animal>()));
        assert_eq!(entry.name(), "Animal");
        assert_eq!(vm.class_base(entry.class_object()), Ok(None));
        assert!(!entry.is_published());
    }

    #[test]
    fn duplicate_registration_returns_existing_entry() {
        let (_, mut registry) = registry();
        let first = registry.register_root::<Animal>("Animal").unwrap();
        let second = registry.register_root::<Animal>("Beast").unwrap();

        assert!(first.ptr_eq(&second));
        assert_eq!(registry.len(), 1);
        assert_eq!(second.upgrade().unwrap().name(), "Animal");
    }

    #[test]
    fn duplicate_registration_ignores_new_parent() {
        let (vm, mut registry) = registry();
        registry.register_root::<Animal>("Animal").unwrap();
        let dog = registry.register_root::<Dog>("Dog").unwrap();
        let again = registry.register_derived::<Dog, Animal>("Dog").unwrap();

        assert!(dog.ptr_eq(&again));
        let class = again.upgrade().unwrap().class_object();
        assert_eq!(vm.class_base(class), Ok(None));
    }

    #[test]
    fn derived_uses_registered_parent_class() {
        let (vm, mut registry) = registry();
        let animal = registry.register_root::<Animal>("Animal").unwrap();
        let dog = registry.register_derived::<Dog, Animal>("Dog").unwrap();
        let puppy = registry.register_derived::<Puppy, Dog>("Puppy").unwrap();

        let animal_class = animal.upgrade().unwrap().class_object();
        let dog_class = dog.upgrade().unwrap().class_object();
        let puppy_class = puppy.upgrade().unwrap().class_object();

        assert_eq!(vm.class_base(dog_class), Ok(Some(animal_class)));
        assert_eq!(vm.class_base(puppy_class), Ok(Some(dog_class)));
    }

    #[test]
    fn missing_parent_is_an_error() {
        let (vm, mut registry) = registry();
        let err = registry.register_derived::<Dog, Animal>("Dog").unwrap_err();

        assert_eq!(
            err,
            RegistryError::MissingParent {
                key: TypeKey::of::<Dog>(),
                parent: TypeKey::of::<Animal>(),
            }
        );
        assert!(registry.is_empty());
        assert_eq!(vm.stack_top(), StackPos(0));
        assert_eq!(vm.object_count(), 1);
    }

    #[test]
    fn parent_registered_afterwards_then_derived_succeeds() {
        let (_, mut registry) = registry();
        assert!(registry.register_derived::<Dog, Animal>("Dog").is_err());
        registry.register_root::<Animal>("Animal").unwrap();
        assert!(registry.register_derived::<Dog, Animal>("Dog").is_ok());
    }

    #[test]
    fn same_named_local_types_get_separate_entries() {
        let (vm, mut registry) = registry();
        let first = {
            struct Shape;
            let weak = registry.register_root::<Shape>("Shape").unwrap();
            weak.upgrade().unwrap().class_object()
        };
        let second = {
            struct Shape;
            let weak = registry.register_root::<Shape>("Circle").unwrap();
            weak.upgrade().unwrap().class_object()
        };

        assert_eq!(registry.len(), 2);
        assert_ne!(first, second);
        assert!(vm.is_live(first));
        assert!(vm.is_live(second));
    }

    #[test]
    fn parent_lookup_does_not_match_same_named_local_type() {
        let (_, mut registry) = registry();
        {
            struct Base;
            registry.register_root::<Base>("Base").unwrap();
        }
        {
            struct Base;
            struct Child;
            let err = registry
                .register_derived::<Child, Base>("Child")
                .unwrap_err();
            assert_eq!(
                err,
                RegistryError::MissingParent {
                    key: TypeKey::of::<Child>(),
                    parent: TypeKey::of::<Base>(),
                }
            );
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn find_and_publish_unknown_is_none() {
        let (vm, registry) = registry();
        assert_eq!(registry.find_and_publish(TypeKey::of::<Animal>()), Ok(None));
        assert!(vm.global_names().is_empty());
    }

    #[test]
    fn find_and_publish_installs_once() {
        let (vm, mut registry) = registry();
        let weak = registry.register_root::<Animal>("Animal").unwrap();
        let key = TypeKey::of::<Animal>();

        let first = registry.find_and_publish(key).unwrap();
        let second = registry.find_and_publish(key).unwrap();
        let class = weak.upgrade().unwrap().class_object();

        assert_eq!(first, Some(class));
        assert_eq!(second, Some(class));
        assert_eq!(vm.global("Animal"), Some(Dynamic::Object(class)));
        assert_eq!(vm.ref_count(class), Some(2));
    }

    #[test]
    fn find_and_publish_propagates_runtime_error() {
        let vm = VmHandle::new(VmConfig::new().with_max_stack_size(2));
        let mut registry = ClassRegistry::new(vm.clone());
        registry.register_root::<Animal>("Animal").unwrap();

        assert_eq!(
            registry.find_and_publish(TypeKey::of::<Animal>()),
            Err(RegistryError::Runtime(RuntimeError::StackOverflow {
                limit: 2
            }))
        );
        assert_eq!(vm.stack_top(), StackPos(0));
    }

    #[test]
    fn erased_entry_lookup() {
        let (_, mut registry) = registry();
        registry.register_root::<Animal>("Animal").unwrap();

        let entry = registry.entry(TypeKey::of::<Animal>()).unwrap();
        assert_eq!(entry.upgrade().unwrap().key(), TypeKey::of::<Animal>());
        assert!(registry.entry(TypeKey::of::<Dog>()).is_none());
    }

    #[test]
    fn clear_expires_handles_and_releases_classes() {
        let (vm, mut registry) = registry();
        let animal = registry.register_root::<Animal>("Animal").unwrap();
        let dog = registry.register_derived::<Dog, Animal>("Dog").unwrap();
        let animal_class = animal.upgrade().unwrap().class_object();
        let dog_class = dog.upgrade().unwrap().class_object();

        registry.clear();

        assert!(animal.upgrade().is_none());
        assert!(dog.upgrade().is_none());
        assert!(!vm.is_live(animal_class));
        assert!(!vm.is_live(dog_class));
        assert_eq!(vm.object_count(), 1);
    }

    #[test]
    fn clear_keeps_published_classes_in_runtime() {
        let (vm, mut registry) = registry();
        registry.register_root::<Animal>("Animal").unwrap();
        registry.register_derived::<Dog, Animal>("Dog").unwrap();
        let dog_class = registry
            .find_and_publish(TypeKey::of::<Dog>())
            .unwrap()
            .unwrap();

        registry.clear();

        // the published slot keeps Dog alive, and Dog keeps its base alive
        assert!(vm.is_live(dog_class));
        let base = vm.class_base(dog_class).unwrap().unwrap();
        assert!(vm.is_live(base));
    }
}
