//! Stable per-type identity keys.
//!
//! A [`TypeKey`] is a 64-bit hash of a native type's [`TypeId`]. Two lookups
//! for the same Rust type always agree, so independent binding sites that
//! touch the same type resolve to one registry entry, while distinct types
//! never share a key even when their names print identically.
//!
//! # Examples
//!
//! ```
//! use squall_core::TypeKey;
//!
//! struct Player;
//!
//! assert_eq!(TypeKey::of::<Player>(), TypeKey::of::<Player>());
//! assert_ne!(TypeKey::of::<Player>(), TypeKey::of::<String>());
//! ```

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

use xxhash_rust::xxh64::Xxh64;

/// Domain-specific mixing constants for key computation.
pub mod hash_constants {
    /// Domain marker for native type keys
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;
}

/// A deterministic 64-bit key identifying a native type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeKey(pub u64);

impl TypeKey {
    /// Key for the Rust type `T`.
    ///
    /// Derived from [`TypeId`], not from [`std::any::type_name`], which is
    /// not unique across same-named types in different scopes.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        let mut hasher = Xxh64::new(0);
        TypeId::of::<T>().hash(&mut hasher);
        TypeKey(hash_constants::TYPE ^ hasher.finish())
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({:#018x})", self.0)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
