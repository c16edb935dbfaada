//! Runtime configuration.

/// Tunable runtime properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VmProperty {
    /// Stack slots reserved up front
    InitStackSize,
    /// Pushes beyond this depth fail with a stack overflow
    MaxStackSize,
}

impl VmProperty {
    pub fn default_value(&self) -> usize {
        match self {
            VmProperty::InitStackSize => 64,
            VmProperty::MaxStackSize => 1024,
        }
    }
}

/// Configuration for a [`VmHandle`](crate::VmHandle).
///
/// ```
/// use squall_vm::VmConfig;
///
/// let config = VmConfig::new().with_max_stack_size(16);
/// assert_eq!(config.max_stack_size, 16);
/// assert_eq!(config.init_stack_size, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmConfig {
    pub init_stack_size: usize,
    pub max_stack_size: usize,
}

impl VmConfig {
    pub fn new() -> Self {
        Self {
            init_stack_size: VmProperty::InitStackSize.default_value(),
            max_stack_size: VmProperty::MaxStackSize.default_value(),
        }
    }

    pub fn with_init_stack_size(mut self, size: usize) -> Self {
        self.init_stack_size = size;
        self
    }

    pub fn with_max_stack_size(mut self, size: usize) -> Self {
        self.max_stack_size = size;
        self
    }

    /// Set a property by key.
    pub fn set_property(&mut self, property: VmProperty, value: usize) {
        match property {
            VmProperty::InitStackSize => self.init_stack_size = value,
            VmProperty::MaxStackSize => self.max_stack_size = value,
        }
    }

    /// Read a property by key.
    pub fn property(&self, property: VmProperty) -> usize {
        match property {
            VmProperty::InitStackSize => self.init_stack_size,
            VmProperty::MaxStackSize => self.max_stack_size,
        }
    }
}

impl Default for VmConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_property_defaults() {
        let config = VmConfig::default();
        assert_eq!(
            config.property(VmProperty::InitStackSize),
            VmProperty::InitStackSize.default_value()
        );
        assert_eq!(
            config.property(VmProperty::MaxStackSize),
            VmProperty::MaxStackSize.default_value()
        );
    }

    #[test]
    fn set_property_round_trips() {
        let mut config = VmConfig::new();
        config.set_property(VmProperty::MaxStackSize, 8);
        assert_eq!(config.max_stack_size, 8);
        assert_eq!(config.property(VmProperty::MaxStackSize), 8);
    }
}
