//! Values passed to and returned from native callables.

use std::fmt;

use crate::ObjectRef;

use super::NativeFn;

/// A dynamic value as seen by native code.
#[derive(Clone, PartialEq, Default)]
pub enum Dynamic {
    /// No value (the return slot before a callable sets one)
    #[default]
    Void,
    /// Script null
    Null,
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// String value (owned)
    String(String),
    /// Handle to a runtime object
    Object(ObjectRef),
    /// Native closure
    Function(NativeFn),
}

impl Dynamic {
    /// Get a human-readable name for this value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Dynamic::Void => "void",
            Dynamic::Null => "null",
            Dynamic::Int(_) => "int",
            Dynamic::Float(_) => "float",
            Dynamic::Bool(_) => "bool",
            Dynamic::String(_) => "string",
            Dynamic::Object(_) => "object",
            Dynamic::Function(_) => "function",
        }
    }

    /// Check if this value is void.
    pub fn is_void(&self) -> bool {
        matches!(self, Dynamic::Void)
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Dynamic::Null)
    }

    /// The native closure, if this value is a function.
    pub fn as_function(&self) -> Option<&NativeFn> {
        match self {
            Dynamic::Function(f) => Some(f),
            _ => None,
        }
    }

    /// The object handle, if this value is an object.
    pub fn as_object(&self) -> Option<ObjectRef> {
        match self {
            Dynamic::Object(obj) => Some(*obj),
            _ => None,
        }
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dynamic::Void => write!(f, "Void"),
            Dynamic::Null => write!(f, "Null"),
            Dynamic::Int(v) => write!(f, "Int({})", v),
            Dynamic::Float(v) => write!(f, "Float({})", v),
            Dynamic::Bool(v) => write!(f, "Bool({})", v),
            Dynamic::String(s) => write!(f, "String({:?})", s),
            Dynamic::Object(h) => write!(f, "Object({:?})", h),
            Dynamic::Function(_) => write!(f, "Function(...)"),
        }
    }
}
