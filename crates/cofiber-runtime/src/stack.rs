//! Fiber stack allocation and seeding
//!
//! Each fiber owns a private mmap'd stack with a PROT_NONE guard page at
//! the low end (stacks grow down), so an overflow faults instead of
//! silently corrupting a neighbour. The block is unmapped when the
//! `FiberStack` is dropped during reclamation.

use crate::arch::{self, SavedRegs};
use crate::pool::FiberEntry;
use cofiber_core::constants::{GUARD_SIZE, PAGE_SIZE};
use cofiber_core::error::{FiberResult, MemoryError};
use cofiber_core::id::FiberId;
use std::ptr;

/// A privately-owned fiber stack, exclusively owned by one pool slot
/// from creation until reclamation.
#[derive(Debug)]
pub struct FiberStack {
    base: *mut u8,
    alloc_size: usize,
}

impl FiberStack {
    /// Map a new stack of `stack_size` usable bytes plus the guard page.
    ///
    /// Follows a reserve-then-activate pattern: the whole block is mapped
    /// PROT_NONE, then everything above the guard page is made
    /// read-write. Freshly mapped pages are zeroed by the kernel, so a
    /// reused slot never observes a previous occupant's stack contents.
    fn allocate(stack_size: usize) -> FiberResult<FiberStack> {
        let alloc_size = stack_size + GUARD_SIZE;

        let base = unsafe {
            libc::mmap(
                ptr::null_mut(),
                alloc_size,
                libc::PROT_NONE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if base == libc::MAP_FAILED {
            return Err(MemoryError::AllocationFailed.into());
        }

        // Guard page at the low end stays PROT_NONE
        let ret = unsafe {
            libc::mprotect(
                (base as *mut u8).add(GUARD_SIZE) as *mut libc::c_void,
                stack_size,
                libc::PROT_READ | libc::PROT_WRITE,
            )
        };
        if ret != 0 {
            unsafe {
                libc::munmap(base, alloc_size);
            }
            return Err(MemoryError::ProtectionFailed.into());
        }

        Ok(FiberStack {
            base: base as *mut u8,
            alloc_size,
        })
    }

    /// Top of the usable stack (high-address end, exclusive)
    #[inline]
    pub fn top(&self) -> *mut u8 {
        unsafe { self.base.add(self.alloc_size) }
    }

    /// Usable stack size in bytes
    #[inline]
    pub fn size(&self) -> usize {
        self.alloc_size - GUARD_SIZE
    }
}

impl Drop for FiberStack {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.base as *mut libc::c_void, self.alloc_size);
        }
    }
}

/// Build a resumable fiber: allocate its stack, seed the top with the id
/// and exit landing, and produce the initial register snapshot whose
/// resume point is the entry trampoline.
///
/// `pool` is the address of the shared pool block, carried into the
/// fiber in a callee-saved register so the exit path can find its slot.
pub(crate) fn build(
    stack_size: usize,
    entry: FiberEntry,
    arg: usize,
    id: FiberId,
    pool: usize,
) -> FiberResult<(FiberStack, SavedRegs)> {
    if stack_size == 0 || stack_size % PAGE_SIZE != 0 {
        return Err(MemoryError::BadStackSize.into());
    }

    let stack = FiberStack::allocate(stack_size)?;
    let mut regs = SavedRegs::default();
    unsafe {
        arch::init_context(
            &mut regs,
            stack.top(),
            entry as usize,
            arg,
            id.as_u32(),
            pool,
        );
    }
    Ok((stack, regs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cofiber_core::error::FiberError;

    extern "C" fn nop_entry(_arg: usize, _id: FiberId) -> usize {
        0
    }

    #[test]
    fn test_allocate_and_write() {
        let stack = FiberStack::allocate(64 * 1024).unwrap();
        assert_eq!(stack.size(), 64 * 1024);
        // Top region must be writable and zeroed
        unsafe {
            let word = stack.top().sub(8) as *mut u64;
            assert_eq!(*word, 0);
            *word = 0xDEAD_BEEF;
            assert_eq!(*word, 0xDEAD_BEEF);
        }
    }

    #[test]
    fn test_build_rejects_bad_sizes() {
        for bad in [0usize, 100, PAGE_SIZE + 1] {
            let err = build(bad, nop_entry, 0, FiberId::new(1), 0).unwrap_err();
            assert_eq!(err, FiberError::Memory(MemoryError::BadStackSize));
        }
    }

    #[test]
    fn test_build_seeds_id_at_top() {
        let (stack, regs) = build(64 * 1024, nop_entry, 7, FiberId::new(3), 0).unwrap();
        let top = (stack.top() as usize) & !0xF;
        let id_word = unsafe { *((top - 16) as *const u64) };
        assert_eq!(id_word, 3);
        // Initial stack pointer points just below the seeded words
        assert!((regs_sp(&regs) as usize) < top);
    }

    fn regs_sp(regs: &SavedRegs) -> u64 {
        #[cfg(target_arch = "x86_64")]
        {
            regs.rsp
        }
        #[cfg(target_arch = "aarch64")]
        {
            regs.sp
        }
    }
}
