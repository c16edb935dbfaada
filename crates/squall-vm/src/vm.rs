//! The runtime handle and its [`Runtime`] implementation.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use squall_core::{
    CallContext, Dynamic, NativeFn, ObjectRef, Runtime, RuntimeError, StackPos,
};

use crate::{HeapObject, ObjectHeap, VmConfig};

struct VmState {
    config: VmConfig,
    heap: ObjectHeap,
    stack: Vec<Dynamic>,
    root: ObjectRef,
}

impl VmState {
    fn new(config: VmConfig) -> Self {
        let mut heap = ObjectHeap::new();
        let root = heap.allocate(HeapObject::table());
        // pinned for the lifetime of the state
        heap.add_ref(root);
        Self {
            stack: Vec::with_capacity(config.init_stack_size),
            config,
            heap,
            root,
        }
    }

    fn retain(&mut self, value: &Dynamic) {
        if let Dynamic::Object(obj) = value {
            self.heap.add_ref(*obj);
        }
    }

    fn release_value(&mut self, value: Dynamic) {
        if let Dynamic::Object(obj) = value {
            self.release_object(obj);
        }
    }

    fn release_object(&mut self, obj: ObjectRef) {
        let mut pending = vec![obj];
        while let Some(obj) = pending.pop() {
            if let Some(freed) = self.heap.release(obj) {
                freed.collect_references(&mut pending);
            }
        }
    }

    fn push(&mut self, value: Dynamic) -> Result<(), RuntimeError> {
        if self.stack.len() >= self.config.max_stack_size {
            return Err(RuntimeError::StackOverflow {
                limit: self.config.max_stack_size,
            });
        }
        self.retain(&value);
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) {
        if let Some(value) = self.stack.pop() {
            self.release_value(value);
        }
    }

    /// Resolve a signed stack index to a position from the bottom.
    fn absolute(&self, index: isize) -> Result<usize, RuntimeError> {
        let top = self.stack.len();
        let resolved = if index < 0 {
            top.checked_sub(index.unsigned_abs())
        } else {
            Some(index as usize).filter(|&i| i < top)
        };
        resolved.ok_or(RuntimeError::StackIndexOutOfRange { index, top })
    }

    fn object_at(&self, index: isize) -> Result<ObjectRef, RuntimeError> {
        let value = &self.stack[self.absolute(index)?];
        value.as_object().ok_or(RuntimeError::TypeMismatch {
            expected: "object",
            found: value.type_name(),
        })
    }

    fn class_at(&self, index: isize) -> Result<ObjectRef, RuntimeError> {
        let obj = self.object_at(index)?;
        let found = self.heap.get(obj).ok_or(RuntimeError::InvalidHandle)?;
        if !found.is_class() {
            return Err(RuntimeError::TypeMismatch {
                expected: "class",
                found: found.kind_name(),
            });
        }
        Ok(obj)
    }

    fn lookup_member(&self, class: ObjectRef, name: &str) -> Result<Option<Dynamic>, RuntimeError> {
        let mut current = Some(class);
        while let Some(obj) = current {
            let found = self.heap.get(obj).ok_or(RuntimeError::InvalidHandle)?;
            if let Some(value) = found.slots().get(name) {
                return Ok(Some(value.clone()));
            }
            current = found.base();
        }
        Ok(None)
    }
}

impl Drop for VmState {
    fn drop(&mut self) {
        let leaked = self.heap.live_count().saturating_sub(1);
        if leaked > 0 {
            tracing::debug!(leaked, "runtime dropped with outstanding objects");
        }
    }
}

/// Shared handle to a single-threaded runtime instance.
///
/// Cloning the handle does not clone the runtime; all clones address the same
/// stack, heap and root table.
#[derive(Clone)]
pub struct VmHandle {
    state: Rc<RefCell<VmState>>,
}

impl VmHandle {
    pub fn new(config: VmConfig) -> Self {
        Self {
            state: Rc::new(RefCell::new(VmState::new(config))),
        }
    }

    /// Whether two handles address the same runtime.
    pub fn same_runtime(&self, other: &VmHandle) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    pub fn config(&self) -> VmConfig {
        self.state.borrow().config.clone()
    }

    /// Read a global slot.
    pub fn global(&self, name: &str) -> Option<Dynamic> {
        let state = self.state.borrow();
        state.heap.get(state.root)?.slots().get(name).cloned()
    }

    /// Sorted names of all global slots.
    pub fn global_names(&self) -> Vec<String> {
        let state = self.state.borrow();
        let mut names: Vec<String> = state
            .heap
            .get(state.root)
            .map(|root| root.slots().keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Whether `obj` is a live class.
    pub fn is_class(&self, obj: ObjectRef) -> bool {
        self.state
            .borrow()
            .heap
            .get(obj)
            .is_some_and(HeapObject::is_class)
    }

    /// Parent of a class.
    pub fn class_base(&self, class: ObjectRef) -> Result<Option<ObjectRef>, RuntimeError> {
        let state = self.state.borrow();
        let obj = state.heap.get(class).ok_or(RuntimeError::InvalidHandle)?;
        if !obj.is_class() {
            return Err(RuntimeError::TypeMismatch {
                expected: "class",
                found: obj.kind_name(),
            });
        }
        Ok(obj.base())
    }

    /// Sorted names of the members defined directly on `class`.
    pub fn own_member_names(&self, class: ObjectRef) -> Result<Vec<String>, RuntimeError> {
        let state = self.state.borrow();
        let obj = state.heap.get(class).ok_or(RuntimeError::InvalidHandle)?;
        let mut names: Vec<String> = obj.slots().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Look up a member on `class` or any of its parents.
    pub fn member(&self, class: ObjectRef, name: &str) -> Result<Option<Dynamic>, RuntimeError> {
        self.state.borrow().lookup_member(class, name)
    }

    /// Call the native closure `name` found on `class` or its parents.
    pub fn call_method(
        &self,
        class: ObjectRef,
        name: &str,
        args: &[Dynamic],
    ) -> Result<Dynamic, RuntimeError> {
        let func = match self.member(class, name)? {
            Some(Dynamic::Function(func)) => func,
            Some(other) => {
                return Err(RuntimeError::TypeMismatch {
                    expected: "function",
                    found: other.type_name(),
                });
            }
            None => {
                return Err(RuntimeError::MemberNotFound {
                    name: name.to_string(),
                });
            }
        };

        // no borrow is held while native code runs
        let mut ret = Dynamic::Void;
        func.call(&mut CallContext::new(args, &mut ret))?;
        Ok(ret)
    }

    /// Reference count of a live object.
    pub fn ref_count(&self, obj: ObjectRef) -> Option<u32> {
        self.state.borrow().heap.ref_count(obj)
    }

    pub fn is_live(&self, obj: ObjectRef) -> bool {
        self.ref_count(obj).is_some()
    }

    /// Number of live heap objects, including the root table.
    pub fn object_count(&self) -> usize {
        self.state.borrow().heap.live_count()
    }

    /// Value at a stack index.
    pub fn stack_value(&self, index: isize) -> Result<Dynamic, RuntimeError> {
        let state = self.state.borrow();
        let at = state.absolute(index)?;
        Ok(state.stack[at].clone())
    }
}

impl Default for VmHandle {
    fn default() -> Self {
        Self::new(VmConfig::default())
    }
}

impl fmt::Debug for VmHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("VmHandle")
            .field("stack_top", &state.stack.len())
            .field("heap", &state.heap)
            .finish()
    }
}

impl Runtime for VmHandle {
    fn stack_top(&self) -> StackPos {
        StackPos(self.state.borrow().stack.len())
    }

    fn set_stack_top(&self, pos: StackPos) {
        let mut state = self.state.borrow_mut();
        while state.stack.len() > pos.0 {
            state.pop();
        }
        if state.stack.len() < pos.0 {
            state.stack.resize(pos.0, Dynamic::Null);
        }
    }

    fn push_root_table(&self) -> Result<(), RuntimeError> {
        let mut state = self.state.borrow_mut();
        let root = state.root;
        state.push(Dynamic::Object(root))
    }

    fn push_string(&self, value: &str) -> Result<(), RuntimeError> {
        self.state
            .borrow_mut()
            .push(Dynamic::String(value.to_string()))
    }

    fn push_object(&self, obj: ObjectRef) -> Result<(), RuntimeError> {
        let mut state = self.state.borrow_mut();
        if state.heap.get(obj).is_none() {
            return Err(RuntimeError::InvalidHandle);
        }
        state.push(Dynamic::Object(obj))
    }

    fn push_native_closure(&self, func: NativeFn) -> Result<(), RuntimeError> {
        self.state.borrow_mut().push(Dynamic::Function(func))
    }

    fn new_class(&self, has_base: bool) -> Result<(), RuntimeError> {
        let mut state = self.state.borrow_mut();
        let base = if has_base {
            let base = state.class_at(-1)?;
            // the popped stack reference becomes the class's base link
            state.stack.pop();
            Some(base)
        } else {
            if state.stack.len() >= state.config.max_stack_size {
                return Err(RuntimeError::StackOverflow {
                    limit: state.config.max_stack_size,
                });
            }
            None
        };

        let class = state.heap.allocate(HeapObject::class(base));
        state.heap.add_ref(class);
        state.stack.push(Dynamic::Object(class));
        tracing::trace!(?class, ?base, "created class");
        Ok(())
    }

    fn get_stack_object(&self, index: isize) -> Result<ObjectRef, RuntimeError> {
        self.state.borrow().object_at(index)
    }

    fn new_slot(&self, index: isize) -> Result<(), RuntimeError> {
        let mut state = self.state.borrow_mut();
        let target_at = state.absolute(index)?;
        let top = state.stack.len();
        if top < 3 || target_at >= top - 2 {
            return Err(RuntimeError::StackIndexOutOfRange { index, top });
        }

        let target = state.object_at(target_at as isize)?;
        if state.heap.get(target).is_none() {
            return Err(RuntimeError::InvalidHandle);
        }
        let key = match &state.stack[top - 2] {
            Dynamic::String(key) => key.clone(),
            other => {
                return Err(RuntimeError::TypeMismatch {
                    expected: "string",
                    found: other.type_name(),
                });
            }
        };

        // the value's stack reference moves into the slot
        let value = state.stack.pop().unwrap_or_default();
        state.stack.pop();
        let replaced = state
            .heap
            .get_mut(target)
            .and_then(|obj| obj.slots_mut().insert(key, value));
        if let Some(old) = replaced {
            state.release_value(old);
        }
        Ok(())
    }

    fn add_ref(&self, obj: ObjectRef) {
        if !self.state.borrow_mut().heap.add_ref(obj) {
            tracing::debug!(?obj, "add_ref on stale handle ignored");
        }
    }

    fn release(&self, obj: ObjectRef) {
        self.state.borrow_mut().release_object(obj);
    }
}

#[cfg(test)]
mod tests {
    use squall_core::{NativeError, StackGuard};

    use super::*;

    fn class_on_top(vm: &VmHandle) -> ObjectRef {
        vm.get_stack_object(-1).unwrap()
    }

    #[test]
    fn fresh_runtime_has_only_root() {
        let vm = VmHandle::default();
        assert_eq!(vm.stack_top(), StackPos(0));
        assert_eq!(vm.object_count(), 1);
        assert!(vm.global_names().is_empty());
    }

    #[test]
    fn new_class_without_base() {
        let vm = VmHandle::default();
        vm.new_class(false).unwrap();
        let class = class_on_top(&vm);

        assert!(vm.is_class(class));
        assert_eq!(vm.class_base(class), Ok(None));
        assert_eq!(vm.ref_count(class), Some(1));
    }

    #[test]
    fn new_class_with_base_consumes_base() {
        let vm = VmHandle::default();
        vm.new_class(false).unwrap();
        let base = class_on_top(&vm);
        vm.new_class(true).unwrap();
        let derived = class_on_top(&vm);

        assert_eq!(vm.stack_top(), StackPos(1));
        assert_eq!(vm.class_base(derived), Ok(Some(base)));
        // held only by the derived class's base link now
        assert_eq!(vm.ref_count(base), Some(1));
    }

    #[test]
    fn new_class_base_must_be_class() {
        let vm = VmHandle::default();
        vm.push_root_table().unwrap();
        let err = vm.new_class(true).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::TypeMismatch {
                expected: "class",
                found: "table"
            }
        );
        assert_eq!(vm.stack_top(), StackPos(1));
    }

    #[test]
    fn dropping_stack_value_frees_class() {
        let vm = VmHandle::default();
        vm.new_class(false).unwrap();
        let class = class_on_top(&vm);
        vm.set_stack_top(StackPos(0));
        assert!(!vm.is_live(class));
        assert_eq!(vm.object_count(), 1);
    }

    #[test]
    fn freeing_derived_releases_base() {
        let vm = VmHandle::default();
        vm.new_class(false).unwrap();
        let base = class_on_top(&vm);
        vm.new_class(true).unwrap();
        vm.set_stack_top(StackPos(0));
        assert!(!vm.is_live(base));
        assert_eq!(vm.object_count(), 1);
    }

    #[test]
    fn new_slot_on_root_table() {
        let vm = VmHandle::default();
        vm.push_root_table().unwrap();
        vm.push_string("answer").unwrap();
        vm.new_class(false).unwrap();
        let class = class_on_top(&vm);
        vm.new_slot(-3).unwrap();

        assert_eq!(vm.stack_top(), StackPos(1));
        assert_eq!(vm.global("answer"), Some(Dynamic::Object(class)));
        assert_eq!(vm.ref_count(class), Some(1));
        vm.set_stack_top(StackPos(0));
        assert!(vm.is_live(class));
    }

    #[test]
    fn new_slot_replaces_and_releases_old_value() {
        let vm = VmHandle::default();
        let install = |name: &str| {
            let _guard = StackGuard::new(&vm);
            vm.push_root_table().unwrap();
            vm.push_string(name).unwrap();
            vm.new_class(false).unwrap();
            let class = class_on_top(&vm);
            vm.new_slot(-3).unwrap();
            class
        };

        let first = install("Slot");
        let second = install("Slot");
        assert!(!vm.is_live(first));
        assert_eq!(vm.global("Slot"), Some(Dynamic::Object(second)));
        assert_eq!(vm.stack_top(), StackPos(0));
    }

    #[test]
    fn new_slot_rejects_non_string_key() {
        let vm = VmHandle::default();
        vm.push_root_table().unwrap();
        vm.new_class(false).unwrap();
        vm.new_class(false).unwrap();
        let err = vm.new_slot(-3).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::TypeMismatch {
                expected: "string",
                found: "object"
            }
        );
        assert_eq!(vm.stack_top(), StackPos(3));
    }

    #[test]
    fn new_slot_needs_target_below_pair() {
        let vm = VmHandle::default();
        vm.push_string("k").unwrap();
        vm.push_string("v").unwrap();
        assert!(matches!(
            vm.new_slot(-1),
            Err(RuntimeError::StackIndexOutOfRange { .. })
        ));
    }

    #[test]
    fn stack_index_resolution() {
        let vm = VmHandle::default();
        vm.push_string("a").unwrap();
        vm.push_string("b").unwrap();
        assert_eq!(vm.stack_value(0), Ok(Dynamic::String("a".into())));
        assert_eq!(vm.stack_value(-1), Ok(Dynamic::String("b".into())));
        assert_eq!(
            vm.stack_value(-3),
            Err(RuntimeError::StackIndexOutOfRange { index: -3, top: 2 })
        );
        assert_eq!(
            vm.stack_value(2),
            Err(RuntimeError::StackIndexOutOfRange { index: 2, top: 2 })
        );
    }

    #[test]
    fn stack_overflow() {
        let vm = VmHandle::new(VmConfig::new().with_max_stack_size(2));
        vm.push_string("a").unwrap();
        vm.push_string("b").unwrap();
        assert_eq!(
            vm.push_string("c"),
            Err(RuntimeError::StackOverflow { limit: 2 })
        );
        assert_eq!(
            vm.new_class(false),
            Err(RuntimeError::StackOverflow { limit: 2 })
        );
    }

    #[test]
    fn set_stack_top_pads_with_null() {
        let vm = VmHandle::default();
        vm.set_stack_top(StackPos(2));
        assert_eq!(vm.stack_value(-1), Ok(Dynamic::Null));
    }

    #[test]
    fn call_method_walks_base_chain() {
        let vm = VmHandle::default();
        vm.new_class(false).unwrap();
        let base = class_on_top(&vm);
        vm.push_string("twice").unwrap();
        vm.push_native_closure(NativeFn::new(|ctx| {
            let x: i64 = ctx.arg(0)?;
            ctx.set_return(x * 2);
            Ok(())
        }))
        .unwrap();
        vm.new_slot(-3).unwrap();

        vm.new_class(true).unwrap();
        let derived = class_on_top(&vm);

        let result = vm.call_method(derived, "twice", &[Dynamic::Int(4)]);
        assert_eq!(result, Ok(Dynamic::Int(8)));
        assert_eq!(vm.own_member_names(derived), Ok(Vec::<String>::new()));
        assert_eq!(vm.own_member_names(base), Ok(vec!["twice".to_string()]));
    }

    #[test]
    fn call_method_errors() {
        let vm = VmHandle::default();
        vm.new_class(false).unwrap();
        let class = class_on_top(&vm);
        vm.push_string("fails").unwrap();
        vm.push_native_closure(NativeFn::new(|_| Err(NativeError::other("broken"))))
            .unwrap();
        vm.new_slot(-3).unwrap();

        assert_eq!(
            vm.call_method(class, "missing", &[]),
            Err(RuntimeError::MemberNotFound {
                name: "missing".into()
            })
        );
        assert_eq!(
            vm.call_method(class, "fails", &[]),
            Err(RuntimeError::Native(NativeError::other("broken")))
        );
    }

    #[test]
    fn external_references_keep_objects_alive() {
        let vm = VmHandle::default();
        vm.new_class(false).unwrap();
        let class = class_on_top(&vm);
        vm.add_ref(class);
        vm.set_stack_top(StackPos(0));
        assert_eq!(vm.ref_count(class), Some(1));
        vm.release(class);
        assert!(!vm.is_live(class));
    }

    #[test]
    fn clones_share_state() {
        let vm = VmHandle::default();
        let other = vm.clone();
        vm.push_string("x").unwrap();
        assert_eq!(other.stack_top(), StackPos(1));
        assert!(vm.same_runtime(&other));
        assert!(!vm.same_runtime(&VmHandle::default()));
    }
}
