//! Fiber slot state

use core::fmt;

/// State of a pool slot
///
/// Transitions are monotonic within one occupancy: `Free -> Running` on
/// create, `Running -> Done` when the fiber's entry function returns,
/// `Done -> Free` when a join reclaims the slot. Every transition happens
/// under the pool lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FiberState {
    /// Slot is unassigned and may be claimed by a create
    Free = 0,

    /// Slot is assigned to a live fiber (executing or suspended)
    Running = 1,

    /// The fiber's entry function returned; result awaits a join
    Done = 2,
}

impl FiberState {
    /// Check if the scheduler may switch into this slot
    #[inline]
    pub const fn is_runnable(&self) -> bool {
        matches!(self, FiberState::Running)
    }

    /// Check if the slot holds a finished, not-yet-reclaimed fiber
    #[inline]
    pub const fn is_done(&self) -> bool {
        matches!(self, FiberState::Done)
    }
}

impl TryFrom<u8> for FiberState {
    type Error = u8;

    /// Rejects unknown discriminants instead of defaulting; a corrupt
    /// state byte must never read as a reclaimable slot.
    fn try_from(v: u8) -> Result<Self, u8> {
        match v {
            0 => Ok(FiberState::Free),
            1 => Ok(FiberState::Running),
            2 => Ok(FiberState::Done),
            _ => Err(v),
        }
    }
}

impl From<FiberState> for u8 {
    fn from(state: FiberState) -> u8 {
        state as u8
    }
}

impl fmt::Display for FiberState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FiberState::Free => write!(f, "free"),
            FiberState::Running => write!(f, "running"),
            FiberState::Done => write!(f, "done"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runnable() {
        assert!(FiberState::Running.is_runnable());
        assert!(!FiberState::Free.is_runnable());
        assert!(!FiberState::Done.is_runnable());
    }

    #[test]
    fn test_done() {
        assert!(FiberState::Done.is_done());
        assert!(!FiberState::Running.is_done());
    }

    #[test]
    fn test_roundtrip() {
        for state in [FiberState::Free, FiberState::Running, FiberState::Done] {
            assert_eq!(FiberState::try_from(u8::from(state)), Ok(state));
        }
    }

    #[test]
    fn test_unknown_discriminant_rejected() {
        assert_eq!(FiberState::try_from(3), Err(3));
        assert_eq!(FiberState::try_from(255), Err(255));
    }
}
