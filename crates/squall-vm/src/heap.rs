//! Generational arena for reference-counted runtime objects.

use std::fmt;

use rustc_hash::FxHashMap;
use squall_core::{Dynamic, ObjectRef};

/// An object living in the heap.
#[derive(Debug)]
pub enum HeapObject {
    /// Plain string-keyed table (the root namespace is one of these)
    Table { slots: FxHashMap<String, Dynamic> },
    /// Class with an optional parent and its own member slots
    Class {
        base: Option<ObjectRef>,
        members: FxHashMap<String, Dynamic>,
    },
}

impl HeapObject {
    /// Empty table.
    pub fn table() -> Self {
        HeapObject::Table {
            slots: FxHashMap::default(),
        }
    }

    /// Empty class deriving from `base`.
    pub fn class(base: Option<ObjectRef>) -> Self {
        HeapObject::Class {
            base,
            members: FxHashMap::default(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            HeapObject::Table { .. } => "table",
            HeapObject::Class { .. } => "class",
        }
    }

    pub fn is_class(&self) -> bool {
        matches!(self, HeapObject::Class { .. })
    }

    /// Parent class, for classes that have one.
    pub fn base(&self) -> Option<ObjectRef> {
        match self {
            HeapObject::Class { base, .. } => *base,
            HeapObject::Table { .. } => None,
        }
    }

    /// Named slots of a table, or own members of a class.
    pub fn slots(&self) -> &FxHashMap<String, Dynamic> {
        match self {
            HeapObject::Table { slots } => slots,
            HeapObject::Class { members, .. } => members,
        }
    }

    pub fn slots_mut(&mut self) -> &mut FxHashMap<String, Dynamic> {
        match self {
            HeapObject::Table { slots } => slots,
            HeapObject::Class { members, .. } => members,
        }
    }

    /// Push every object this one holds a reference on.
    pub(crate) fn collect_references(self, out: &mut Vec<ObjectRef>) {
        let (base, slots) = match self {
            HeapObject::Table { slots } => (None, slots),
            HeapObject::Class { base, members } => (base, members),
        };
        out.extend(base);
        out.extend(slots.into_values().filter_map(|v| v.as_object()));
    }
}

/// Heap storage with generational indices.
///
/// Objects start with a reference count of zero; whoever stores the handle
/// (a stack slot, a table slot, a class base link, or an external owner via
/// `add_ref`) takes a reference. When a slot is freed its generation is bumped
/// so stale handles stop resolving.
pub struct ObjectHeap {
    slots: Vec<HeapSlot>,
    free_list: Vec<u32>,
}

struct HeapSlot {
    generation: u32,
    value: Option<HeapObject>,
    ref_count: u32,
}

impl ObjectHeap {
    /// Create a new empty object heap.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Allocate a new object with no references.
    pub fn allocate(&mut self, value: HeapObject) -> ObjectRef {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            slot.ref_count = 0;
            ObjectRef::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(HeapSlot {
                generation: 0,
                value: Some(value),
                ref_count: 0,
            });
            ObjectRef::new(index, 0)
        }
    }

    fn slot(&self, handle: ObjectRef) -> Option<&HeapSlot> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation && slot.value.is_some())
    }

    fn slot_mut(&mut self, handle: ObjectRef) -> Option<&mut HeapSlot> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation && slot.value.is_some())
    }

    /// Get immutable reference to an object.
    ///
    /// Returns None if the handle is stale.
    pub fn get(&self, handle: ObjectRef) -> Option<&HeapObject> {
        self.slot(handle)?.value.as_ref()
    }

    /// Get mutable reference to an object.
    pub fn get_mut(&mut self, handle: ObjectRef) -> Option<&mut HeapObject> {
        self.slot_mut(handle)?.value.as_mut()
    }

    /// Increment reference count.
    pub fn add_ref(&mut self, handle: ObjectRef) -> bool {
        match self.slot_mut(handle) {
            Some(slot) => {
                slot.ref_count = slot.ref_count.saturating_add(1);
                true
            }
            None => false,
        }
    }

    /// Decrement reference count, free if zero.
    ///
    /// Returns the freed object so the caller can release what it referenced.
    pub fn release(&mut self, handle: ObjectRef) -> Option<HeapObject> {
        let slot = self.slot_mut(handle)?;
        slot.ref_count = slot.ref_count.saturating_sub(1);
        if slot.ref_count > 0 {
            return None;
        }
        let freed = slot.value.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(handle.index);
        freed
    }

    /// Get the reference count for an object.
    pub fn ref_count(&self, handle: ObjectRef) -> Option<u32> {
        self.slot(handle).map(|slot| slot.ref_count)
    }

    /// Number of live objects.
    pub fn live_count(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }
}

impl Default for ObjectHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectHeap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHeap")
            .field("slot_count", &self.slots.len())
            .field("free_count", &self.free_list.len())
            .finish()
    }
}
