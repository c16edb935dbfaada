//! Conversions between Rust values and [`Dynamic`].

use crate::{Dynamic, NativeError, ObjectRef};

/// Extract a Rust value from a [`Dynamic`].
pub trait FromDynamic: Sized {
    /// Convert, failing with [`NativeError::Conversion`] on a kind mismatch.
    fn from_dynamic(value: &Dynamic) -> Result<Self, NativeError>;
}

/// Convert a Rust value into a [`Dynamic`].
pub trait IntoDynamic {
    fn into_dynamic(self) -> Dynamic;
}

fn mismatch(expected: &'static str, value: &Dynamic) -> NativeError {
    NativeError::Conversion {
        expected,
        found: value.type_name(),
    }
}

impl FromDynamic for i64 {
    fn from_dynamic(value: &Dynamic) -> Result<Self, NativeError> {
        match value {
            Dynamic::Int(v) => Ok(*v),
            other => Err(mismatch("int", other)),
        }
    }
}

impl FromDynamic for i32 {
    fn from_dynamic(value: &Dynamic) -> Result<Self, NativeError> {
        match value {
            Dynamic::Int(v) => i32::try_from(*v).map_err(|_| mismatch("int", value)),
            other => Err(mismatch("int", other)),
        }
    }
}

impl FromDynamic for f64 {
    fn from_dynamic(value: &Dynamic) -> Result<Self, NativeError> {
        match value {
            Dynamic::Float(v) => Ok(*v),
            Dynamic::Int(v) => Ok(*v as f64),
            other => Err(mismatch("float", other)),
        }
    }
}

impl FromDynamic for bool {
    fn from_dynamic(value: &Dynamic) -> Result<Self, NativeError> {
        match value {
            Dynamic::Bool(v) => Ok(*v),
            other => Err(mismatch("bool", other)),
        }
    }
}

impl FromDynamic for String {
    fn from_dynamic(value: &Dynamic) -> Result<Self, NativeError> {
        match value {
            Dynamic::String(s) => Ok(s.clone()),
            other => Err(mismatch("string", other)),
        }
    }
}

impl FromDynamic for ObjectRef {
    fn from_dynamic(value: &Dynamic) -> Result<Self, NativeError> {
        value.as_object().ok_or_else(|| mismatch("object", value))
    }
}

impl FromDynamic for Dynamic {
    fn from_dynamic(value: &Dynamic) -> Result<Self, NativeError> {
        Ok(value.clone())
    }
}

impl IntoDynamic for () {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Void
    }
}

impl IntoDynamic for i64 {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Int(self)
    }
}

impl IntoDynamic for i32 {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Int(self as i64)
    }
}

impl IntoDynamic for f64 {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Float(self)
    }
}

impl IntoDynamic for bool {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Bool(self)
    }
}

impl IntoDynamic for String {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::String(self)
    }
}

impl IntoDynamic for &str {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::String(self.to_string())
    }
}

impl IntoDynamic for ObjectRef {
    fn into_dynamic(self) -> Dynamic {
        Dynamic::Object(self)
    }
}

impl IntoDynamic for Dynamic {
    fn into_dynamic(self) -> Dynamic {
        self
    }
}
