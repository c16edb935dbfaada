//! Runtime instance paired with its class registry.

use std::cell::RefCell;
use std::fmt;
use std::rc::Weak;

use squall_core::{Dynamic, ObjectRef, RegistryError, RuntimeError, TypeKey};
use squall_registry::{ClassRegistry, RegistryEntry};
use squall_vm::{VmConfig, VmHandle};

/// A runtime instance and the class registry that belongs to it.
///
/// The registry lives exactly as long as the `Vm`. Dropping the `Vm` tears
/// the registry down first, releasing every class object it created, so
/// outstanding [`Klass`](crate::Klass) binders see their entries expire.
pub struct Vm {
    registry: RefCell<ClassRegistry<VmHandle>>,
    runtime: VmHandle,
}

impl Vm {
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        let runtime = VmHandle::new(config);
        Self {
            registry: RefCell::new(ClassRegistry::new(runtime.clone())),
            runtime,
        }
    }

    /// The underlying runtime handle.
    pub fn handle(&self) -> &VmHandle {
        &self.runtime
    }

    /// Run `f` against this runtime's class registry.
    ///
    /// Fails with [`RegistryError::RegistryBusy`] if a registration is in
    /// progress, e.g. when called from inside another registry callback.
    pub fn with_klass_table<Out>(
        &self,
        f: impl FnOnce(&ClassRegistry<VmHandle>) -> Out,
    ) -> Result<Out, RegistryError> {
        let registry = self
            .registry
            .try_borrow()
            .map_err(|_| RegistryError::RegistryBusy)?;
        Ok(f(&registry))
    }

    /// Register native type `C`, or return its existing entry.
    ///
    /// Fails with [`RegistryError::RegistryBusy`] when the registry is
    /// borrowed elsewhere, e.g. from inside [`with_klass_table`](Self::with_klass_table).
    pub fn register_type<C: 'static>(
        &self,
        name: &str,
        parent: Option<TypeKey>,
    ) -> Result<Weak<RegistryEntry<VmHandle, C>>, RegistryError> {
        self.registry
            .try_borrow_mut()
            .map_err(|_| RegistryError::RegistryBusy)?
            .register_type::<C>(name, parent)
    }

    pub fn is_registered<C: 'static>(&self) -> Result<bool, RegistryError> {
        self.with_klass_table(|table| table.contains(TypeKey::of::<C>()))
    }

    /// Publish the class bound to `C` and return it.
    ///
    /// Useful when the class must be visible before its binder finishes.
    /// `Ok(None)` means `C` has not been registered.
    pub fn klass_object<C: 'static>(&self) -> Result<Option<ObjectRef>, RegistryError> {
        self.find_and_publish(TypeKey::of::<C>())
    }

    pub fn find_and_publish(&self, key: TypeKey) -> Result<Option<ObjectRef>, RegistryError> {
        self.with_klass_table(|table| table.find_and_publish(key))?
    }

    /// Call `method` on the global class `class_name`.
    pub fn call(
        &self,
        class_name: &str,
        method: &str,
        args: &[Dynamic],
    ) -> Result<Dynamic, RuntimeError> {
        let class = match self.runtime.global(class_name) {
            Some(Dynamic::Object(class)) => class,
            Some(other) => {
                return Err(RuntimeError::TypeMismatch {
                    expected: "class",
                    found: other.type_name(),
                });
            }
            None => {
                return Err(RuntimeError::MemberNotFound {
                    name: class_name.to_string(),
                });
            }
        };
        self.runtime.call_method(class, method, args)
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Vm {
    fn drop(&mut self) {
        self.registry.get_mut().clear();
    }
}

impl fmt::Debug for Vm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vm")
            .field("runtime", &self.runtime)
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use squall_core::{Runtime, StackPos};
    use squall_registry::ErasedEntry;

    use super::*;

    struct Thing;

    #[test]
    fn registry_shares_the_runtime() {
        let vm = Vm::new();
        let shared = vm
            .with_klass_table(|table| table.runtime().same_runtime(vm.handle()))
            .unwrap();
        assert!(shared);
        assert_eq!(vm.with_klass_table(|table| table.is_empty()), Ok(true));
    }

    #[test]
    fn klass_object_for_unregistered_type() {
        let vm = Vm::new();
        assert_eq!(vm.klass_object::<Thing>(), Ok(None));
        assert_eq!(vm.is_registered::<Thing>(), Ok(false));
    }

    #[test]
    fn drop_releases_registry_classes() {
        let vm = Vm::new();
        let handle = vm.handle().clone();
        let weak = vm.register_type::<Thing>("Thing", None).unwrap();
        let class = weak.upgrade().unwrap().class_object();

        drop(vm);

        assert!(weak.upgrade().is_none());
        assert!(!handle.is_live(class));
        assert_eq!(handle.stack_top(), StackPos(0));
    }

    #[test]
    fn registering_while_table_is_borrowed_fails_cleanly() {
        let vm = Vm::new();
        let nested = vm
            .with_klass_table(|_| vm.register_type::<Thing>("Thing", None).map(|_| ()))
            .unwrap();

        assert_eq!(nested, Err(RegistryError::RegistryBusy));
        assert_eq!(vm.is_registered::<Thing>(), Ok(false));
        assert!(vm.register_type::<Thing>("Thing", None).is_ok());
        assert_eq!(vm.is_registered::<Thing>(), Ok(true));
    }

    #[test]
    fn call_reports_unknown_class() {
        let vm = Vm::new();
        assert_eq!(
            vm.call("Nope", "x", &[]),
            Err(RuntimeError::MemberNotFound {
                name: "Nope".into()
            })
        );
    }

    #[test]
    fn config_is_forwarded() {
        let vm = Vm::with_config(VmConfig::new().with_max_stack_size(5));
        assert_eq!(vm.handle().config().max_stack_size, 5);
    }
}
