//! Fiber identifier type

use core::fmt;

/// Unique identifier for a fiber
///
/// A fiber id indexes directly into the pool's slot table. Id 0 is the
/// controller: the ambient execution context that initialized the pool.
/// Ids are reused after a finished fiber has been joined and reclaimed.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct FiberId(u32);

impl FiberId {
    /// The reserved controller slot
    pub const CONTROLLER: FiberId = FiberId(0);

    /// Create a new FiberId from a raw slot index
    #[inline]
    pub const fn new(id: u32) -> Self {
        FiberId(id)
    }

    /// Get the raw u32 value
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Get as usize for indexing the slot table
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Check if this is the controller's reserved id
    #[inline]
    pub const fn is_controller(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for FiberId {
    #[inline]
    fn from(id: u32) -> Self {
        FiberId(id)
    }
}

impl From<FiberId> for u32 {
    #[inline]
    fn from(id: FiberId) -> Self {
        id.0
    }
}

impl fmt::Debug for FiberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FiberId({})", self.0)
    }
}

impl fmt::Display for FiberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fiber_id_basics() {
        let id = FiberId::new(42);
        assert_eq!(id.as_u32(), 42);
        assert_eq!(id.as_usize(), 42);
        assert!(!id.is_controller());
    }

    #[test]
    fn test_controller_id() {
        assert!(FiberId::CONTROLLER.is_controller());
        assert_eq!(FiberId::CONTROLLER.as_u32(), 0);
        assert_eq!(FiberId::new(0), FiberId::CONTROLLER);
    }

    #[test]
    fn test_fiber_id_conversions() {
        let id: FiberId = 7u32.into();
        let raw: u32 = id.into();
        assert_eq!(raw, 7);
    }

    #[test]
    fn test_fiber_id_display() {
        assert_eq!(format!("{}", FiberId::new(3)), "3");
        assert_eq!(format!("{:?}", FiberId::new(3)), "FiberId(3)");
    }
}
