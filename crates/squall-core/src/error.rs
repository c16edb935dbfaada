//! Error types shared by the registry and runtimes.
//!
//! ## Error Hierarchy
//!
//! ```text
//! RegistryError        - class registration and publication
//! ├── MissingParent    - derived type registered before its parent
//! ├── ExpiredEntry     - binder outlived the registry
//! ├── KeyCollision     - two native types hashed to one key
//! ├── RegistryBusy     - registry accessed while already borrowed
//! └── Runtime          - anything the runtime reported, passed through unchanged
//!     └── Native       - error raised by a native callable
//! ```

use thiserror::Error;

use crate::TypeKey;

// ============================================================================
// Native Call Errors
// ============================================================================

/// Errors raised by native callables and argument conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NativeError {
    /// Argument index past the end of the argument list.
    #[error("argument index {index} out of bounds (count: {count})")]
    ArgumentIndexOutOfBounds { index: usize, count: usize },

    /// Argument had the wrong dynamic type.
    #[error("conversion error: expected {expected}, found {found}")]
    Conversion {
        expected: &'static str,
        found: &'static str,
    },

    /// Free-form failure reported by the callable itself.
    #[error("{0}")]
    Other(String),
}

impl NativeError {
    /// Create a free-form native error.
    pub fn other(message: impl Into<String>) -> Self {
        NativeError::Other(message.into())
    }
}

// ============================================================================
// Runtime Errors
// ============================================================================

/// Errors reported by a [`Runtime`](crate::Runtime) implementation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// Pushing would exceed the configured stack depth.
    #[error("stack overflow (limit: {limit})")]
    StackOverflow { limit: usize },

    /// A stack index did not address a live slot.
    #[error("stack index {index} out of range (top: {top})")]
    StackIndexOutOfRange { index: isize, top: usize },

    /// A value had the wrong kind for the operation.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// An object handle was stale or never valid.
    #[error("invalid object handle")]
    InvalidHandle,

    /// A member lookup found nothing.
    #[error("member '{name}' not found")]
    MemberNotFound { name: String },

    /// A native callable failed.
    #[error("native call failed: {0}")]
    Native(#[from] NativeError),
}

// ============================================================================
// Registry Errors
// ============================================================================

/// Errors from class registration, method binding and publication.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// A derived type was registered before its parent type.
    #[error("parent type {parent} of {key} is not registered")]
    MissingParent { key: TypeKey, parent: TypeKey },

    /// The registry entry behind a binder no longer exists.
    #[error("registry entry for {key} has expired")]
    ExpiredEntry { key: TypeKey },

    /// An existing entry under this key belongs to a different native type.
    #[error("type key {key} is already bound to a different native type")]
    KeyCollision { key: TypeKey },

    /// The registry was re-entered while a caller still held it.
    #[error("class registry is already in use")]
    RegistryBusy,

    /// The runtime rejected an operation.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
