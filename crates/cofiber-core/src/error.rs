//! Error types for the fiber pool

use core::fmt;

/// Result type for pool operations
pub type FiberResult<T> = Result<T, FiberError>;

/// Errors that can occur in pool operations
///
/// Pool exhaustion and allocation failures are surfaced to the caller
/// rather than terminating the process; the only fatal condition is a
/// corrupted scheduler table (the controller slot no longer resumable),
/// which has no well-defined continuation and aborts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FiberError {
    /// No free fiber slot available
    PoolExhausted,

    /// Join target was never created, was already reclaimed, or can
    /// never complete (the controller slot, or the caller itself)
    InvalidTarget,

    /// Pool capacity outside the supported range
    InvalidCapacity,

    /// Stack allocation/mapping failed
    Memory(MemoryError),
}

impl fmt::Display for FiberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FiberError::PoolExhausted => write!(f, "no fiber slots available"),
            FiberError::InvalidTarget => write!(f, "invalid join target"),
            FiberError::InvalidCapacity => write!(f, "invalid pool capacity"),
            FiberError::Memory(e) => write!(f, "memory error: {}", e),
        }
    }
}

impl std::error::Error for FiberError {}

/// Memory-related errors from the stack builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// mmap failed
    AllocationFailed,

    /// mprotect failed
    ProtectionFailed,

    /// Requested stack size is zero or not a page multiple
    BadStackSize,
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::AllocationFailed => write!(f, "stack allocation failed"),
            MemoryError::ProtectionFailed => write!(f, "stack protection change failed"),
            MemoryError::BadStackSize => write!(f, "bad stack size"),
        }
    }
}

impl From<MemoryError> for FiberError {
    fn from(e: MemoryError) -> Self {
        FiberError::Memory(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = FiberError::PoolExhausted;
        assert_eq!(format!("{}", e), "no fiber slots available");

        let e = FiberError::Memory(MemoryError::AllocationFailed);
        assert_eq!(format!("{}", e), "memory error: stack allocation failed");
    }

    #[test]
    fn test_error_conversion() {
        let mem_err = MemoryError::BadStackSize;
        let err: FiberError = mem_err.into();
        assert!(matches!(err, FiberError::Memory(MemoryError::BadStackSize)));
    }
}
