//! Call context bridging the runtime and native Rust functions.

use crate::NativeError;
use crate::convert::{FromDynamic, IntoDynamic};

use super::Dynamic;

/// Context for native function calls.
///
/// Gives typed access to the arguments and a slot for the return value:
///
/// ```ignore
/// let x: i64 = ctx.arg(0)?;
/// ctx.set_return(x + 1);
/// ```
pub struct CallContext<'a> {
    args: &'a [Dynamic],
    return_slot: &'a mut Dynamic,
}

impl<'a> CallContext<'a> {
    /// Create a new call context.
    pub fn new(args: &'a [Dynamic], return_slot: &'a mut Dynamic) -> Self {
        Self { args, return_slot }
    }

    /// Get the number of arguments.
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Get a raw reference to an argument.
    pub fn arg_slot(&self, index: usize) -> Result<&Dynamic, NativeError> {
        self.args
            .get(index)
            .ok_or(NativeError::ArgumentIndexOutOfBounds {
                index,
                count: self.args.len(),
            })
    }

    /// Get a typed argument value.
    pub fn arg<T: FromDynamic>(&self, index: usize) -> Result<T, NativeError> {
        T::from_dynamic(self.arg_slot(index)?)
    }

    /// Set the return value from a raw value.
    pub fn set_return_slot(&mut self, value: Dynamic) {
        *self.return_slot = value;
    }

    /// Set a typed return value.
    pub fn set_return<T: IntoDynamic>(&mut self, value: T) {
        *self.return_slot = value.into_dynamic();
    }
}
