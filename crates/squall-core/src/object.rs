//! Opaque runtime handles.

use std::fmt;

/// Handle to an object living inside a runtime.
///
/// Holding an `ObjectRef` does not keep the object alive; ownership is
/// expressed through [`Runtime::add_ref`](crate::Runtime::add_ref) and
/// [`Runtime::release`](crate::Runtime::release). The generation lets a
/// runtime reject handles to slots that have since been reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Slot index inside the runtime's heap
    pub index: u32,
    /// Generation for use-after-free detection
    pub generation: u32,
}

impl ObjectRef {
    /// Create a new object handle.
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({}@{})", self.index, self.generation)
    }
}

/// A saved value-stack depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StackPos(pub usize);
