//! Squall reference runtime.
//!
//! A small single-threaded runtime that implements [`squall_core::Runtime`]:
//! a value stack, a reference-counted object heap holding tables and
//! classes, and one root table acting as the global namespace. Native
//! closures stored on classes can be invoked through [`VmHandle::call_method`],
//! with lookup walking the class inheritance chain.

mod config;
mod heap;
mod vm;

pub use config::{VmConfig, VmProperty};
pub use heap::{HeapObject, ObjectHeap};
pub use vm::VmHandle;
