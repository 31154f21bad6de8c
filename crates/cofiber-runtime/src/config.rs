//! Pool configuration
//!
//! Compile-time defaults with runtime environment overrides, builder
//! style.
//!
//! # Example
//!
//! ```rust,ignore
//! use cofiber_runtime::PoolConfig;
//!
//! // Library defaults with env overrides
//! let config = PoolConfig::from_env();
//!
//! // Or customize programmatically
//! let config = PoolConfig::new().capacity(8).debug(true);
//! ```

use cofiber_core::constants::{DEFAULT_MAX_FIBERS, DEFAULT_STACK_SIZE, MAX_FIBERS};
use cofiber_core::env::{env_get, env_get_bool};
use cofiber_core::error::{FiberError, FiberResult};

/// Fiber pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Slot table capacity, including the reserved controller slot 0
    pub capacity: usize,
    /// Usable stack size per fiber, must be a page multiple
    pub stack_size: usize,
    /// Emit scheduling/termination events on the diagnostic stream.
    /// Has no effect on scheduling behavior itself.
    pub debug: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl PoolConfig {
    /// Library defaults, no environment lookups
    pub fn new() -> Self {
        Self {
            capacity: DEFAULT_MAX_FIBERS,
            stack_size: DEFAULT_STACK_SIZE,
            debug: false,
        }
    }

    /// Library defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `FIB_MAX_FIBERS` - Pool capacity (controller slot included)
    /// - `FIB_STACK_SIZE` - Usable stack bytes per fiber
    /// - `FIB_DEBUG` - Emit scheduling events (0/1)
    pub fn from_env() -> Self {
        Self {
            capacity: env_get("FIB_MAX_FIBERS", DEFAULT_MAX_FIBERS),
            stack_size: env_get("FIB_STACK_SIZE", DEFAULT_STACK_SIZE),
            debug: env_get_bool("FIB_DEBUG", false),
        }
    }

    /// Set the slot table capacity
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the per-fiber stack size
    pub fn stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = stack_size;
        self
    }

    /// Enable or disable scheduling diagnostics
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Validate the configuration.
    ///
    /// Capacity needs room for the controller plus at least one fiber.
    /// Stack sizes are validated per-create by the stack builder, so a
    /// bad size fails that create, not pool construction.
    pub fn validate(&self) -> FiberResult<()> {
        if self.capacity < 2 || self.capacity > MAX_FIBERS {
            return Err(FiberError::InvalidCapacity);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        assert!(PoolConfig::new().validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = PoolConfig::new().capacity(8).stack_size(64 * 1024).debug(true);
        assert_eq!(config.capacity, 8);
        assert_eq!(config.stack_size, 64 * 1024);
        assert!(config.debug);
    }

    #[test]
    fn test_capacity_bounds() {
        assert_eq!(
            PoolConfig::new().capacity(0).validate(),
            Err(FiberError::InvalidCapacity)
        );
        assert_eq!(
            PoolConfig::new().capacity(1).validate(),
            Err(FiberError::InvalidCapacity)
        );
        assert_eq!(
            PoolConfig::new().capacity(MAX_FIBERS + 1).validate(),
            Err(FiberError::InvalidCapacity)
        );
        assert!(PoolConfig::new().capacity(2).validate().is_ok());
    }
}
