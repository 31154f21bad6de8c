//! The fiber pool: slot table, round-robin scheduler and exit path
//!
//! A pool multiplexes fibers onto the single OS thread it was created
//! on. Slot 0 is the controller: the ambient context that built the pool.
//! It is never free, owns no stack, and every finished fiber hands
//! control back to it.
//!
//! All slot-state mutation happens under the pool spinlock. The lock is
//! never held across a context switch; a yield requested while the lock
//! is held is dropped, not queued (see [`FiberPool::yield_to_next`]).

use crate::arch::{self, SavedRegs};
use crate::config::PoolConfig;
use crate::stack::{self, FiberStack};
use cofiber_core::error::{FiberError, FiberResult};
use cofiber_core::id::FiberId;
use cofiber_core::spinlock::SpinLock;
use cofiber_core::state::FiberState;
use cofiber_core::{kdebug, kerror};

/// A fiber entry function.
///
/// Receives the argument passed to [`FiberPool::create`] and the id the
/// pool assigned. The returned value is stored in the slot and handed
/// back by [`FiberPool::join`].
pub type FiberEntry = extern "C" fn(arg: usize, id: FiberId) -> usize;

/// One pool entry
struct FiberSlot {
    state: FiberState,
    regs: SavedRegs,
    stack: Option<FiberStack>,
    result: usize,
}

impl FiberSlot {
    fn idle() -> Self {
        Self {
            state: FiberState::Free,
            regs: SavedRegs::default(),
            stack: None,
            result: 0,
        }
    }
}

/// Lock-guarded slot table
struct PoolInner {
    slots: Box<[FiberSlot]>,
}

/// The shared pool block. Boxed behind [`FiberPool`] so its address is
/// stable even if the pool handle moves; fibers carry a pointer to it in
/// a callee-saved register for the exit path.
pub(crate) struct PoolShared {
    lock: SpinLock<PoolInner>,
    capacity: usize,
    stack_size: usize,
    debug: bool,
}

/// A cooperative fiber pool bound to the OS thread that created it.
///
/// ```ignore
/// let pool = FiberPool::new(PoolConfig::new().capacity(8))?;
/// let id = pool.create(entry, arg)?;
/// pool.yield_to_next(FiberId::CONTROLLER);
/// let result = pool.join(id, FiberId::CONTROLLER)?;
/// ```
pub struct FiberPool {
    shared: Box<PoolShared>,
}

impl FiberPool {
    /// Create a pool with all slots free except slot 0, which is bound
    /// to the caller's own already-running context.
    ///
    /// The controller's register snapshot is filled by its first
    /// switch-out; until then the slot only reserves the id.
    pub fn new(config: PoolConfig) -> FiberResult<Self> {
        config.validate()?;

        // Debug mode implies the debug log level, so FIB_DEBUG=1 alone
        // is enough to see scheduling events.
        if config.debug {
            cofiber_core::kprint::set_log_level(cofiber_core::kprint::LogLevel::Debug);
        }

        let mut slots: Vec<FiberSlot> = (0..config.capacity).map(|_| FiberSlot::idle()).collect();
        slots[0].state = FiberState::Running;

        Ok(Self {
            shared: Box::new(PoolShared {
                lock: SpinLock::new(PoolInner {
                    slots: slots.into_boxed_slice(),
                }),
                capacity: config.capacity,
                stack_size: config.stack_size,
                debug: config.debug,
            }),
        })
    }

    /// Slot table capacity, controller slot included
    #[inline]
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Current state of a slot
    pub fn state(&self, id: FiberId) -> FiberResult<FiberState> {
        if id.as_usize() >= self.shared.capacity {
            return Err(FiberError::InvalidTarget);
        }
        Ok(self.shared.lock.lock().slots[id.as_usize()].state)
    }

    /// Create a new fiber, returning its assigned id.
    ///
    /// The lowest free slot other than 0 is claimed; `PoolExhausted` if
    /// none. The slot is marked Running before the stack is built so a
    /// concurrent create cannot claim it twice; a failed build rolls the
    /// slot back to Free and returns the error.
    pub fn create(&self, entry: FiberEntry, arg: usize) -> FiberResult<FiberId> {
        self.shared.create(entry, arg)
    }

    /// Voluntarily relinquish to the next Running slot after `current`,
    /// scanning circularly. No-op when the pool lock is held (deferred
    /// yield: dropped, never queued — a fiber yielding only from inside
    /// a locked region starves the others) or when no other fiber is
    /// runnable.
    pub fn yield_to_next(&self, current: FiberId) {
        self.shared.yield_to_next(current)
    }

    /// Cooperatively wait for `target` to finish, reclaim its slot and
    /// return its result.
    ///
    /// While the target runs, the caller repeatedly yields. Once it is
    /// Done, its stack is freed, its slot returns to Free (and may be
    /// handed out by a later create), and the stored result is returned.
    /// `InvalidTarget` if the slot is free (never created, or already
    /// reclaimed by an earlier join), out of range, the controller, or
    /// the caller itself.
    pub fn join(&self, target: FiberId, current: FiberId) -> FiberResult<usize> {
        self.shared.join(target, current)
    }
}

impl PoolShared {
    fn create(&self, entry: FiberEntry, arg: usize) -> FiberResult<FiberId> {
        let id = {
            let mut inner = self.lock.lock();
            let idx = (1..self.capacity)
                .find(|&i| inner.slots[i].state == FiberState::Free)
                .ok_or(FiberError::PoolExhausted)?;
            // Reserve before building so no other create can claim it
            inner.slots[idx].state = FiberState::Running;
            inner.slots[idx].result = 0;
            FiberId::new(idx as u32)
        };

        // mmap outside the lock; the slot is already reserved
        let pool_addr = self as *const PoolShared as usize;
        match stack::build(self.stack_size, entry, arg, id, pool_addr) {
            Ok((stack, regs)) => {
                let mut inner = self.lock.lock();
                let slot = &mut inner.slots[id.as_usize()];
                slot.regs = regs;
                slot.stack = Some(stack);
                drop(inner);
                if self.debug {
                    kdebug!("create: fiber {} ready", id);
                }
                Ok(id)
            }
            Err(e) => {
                let mut inner = self.lock.lock();
                inner.slots[id.as_usize()].state = FiberState::Free;
                drop(inner);
                Err(e)
            }
        }
    }

    fn yield_to_next(&self, current: FiberId) {
        // Deferred-yield rule: never switch away from inside a critical
        // section. The request is dropped; the caller must yield again
        // after releasing the lock if it needs progress.
        if self.lock.is_locked() {
            return;
        }

        let cur = current.as_usize();
        if cur >= self.capacity {
            return;
        }

        let (save, resume) = {
            let mut inner = self.lock.lock();
            let mut next = (cur + 1) % self.capacity;
            while next != cur {
                if inner.slots[next].state.is_runnable() {
                    break;
                }
                next = (next + 1) % self.capacity;
            }
            if self.debug {
                kdebug!("yield: current={} next={}", cur, next);
            }
            if next == cur {
                return;
            }
            let save = &mut inner.slots[cur].regs as *mut SavedRegs;
            let resume = &inner.slots[next].regs as *const SavedRegs;
            (save, resume)
        };

        // Lock released before the switch. Safe because the only state
        // transitions affecting eligibility are made under the lock by
        // the transitioning fiber itself.
        unsafe { arch::context_switch(save, resume) };
    }

    fn join(&self, target: FiberId, current: FiberId) -> FiberResult<usize> {
        let idx = target.as_usize();
        // The controller never finishes and a fiber cannot wait on
        // itself, so neither join can ever complete.
        if idx == 0 || idx >= self.capacity || target == current {
            return Err(FiberError::InvalidTarget);
        }

        loop {
            {
                let inner = self.lock.lock();
                match inner.slots[idx].state {
                    FiberState::Free => return Err(FiberError::InvalidTarget),
                    FiberState::Done => break,
                    FiberState::Running => {}
                }
            }
            self.yield_to_next(current);
        }

        // Reclaim: capture the result, drop the stack, return the slot
        // to Free so a later create may reuse the id.
        let (result, stack) = {
            let mut inner = self.lock.lock();
            let slot = &mut inner.slots[idx];
            let result = slot.result;
            let stack = slot.stack.take();
            slot.state = FiberState::Free;
            slot.regs = SavedRegs::default();
            slot.result = 0;
            (result, stack)
        };
        // munmap outside the lock
        drop(stack);

        if self.debug {
            kdebug!("join: fiber {} reclaimed by {}", target, current);
        }
        Ok(result)
    }
}

/// Landing point for every returning fiber, called from the arch exit
/// trampoline on the dying fiber's own stack. Records the result, marks
/// the slot Done and switches unconditionally back to the controller.
///
/// Nothing ever resumes the context saved here; the slot is reclaimed by
/// a join. If the switch *does* return, slot 0 was not resumable, the
/// table is corrupt, and there is no well-defined continuation: abort.
pub(crate) extern "C" fn fiber_finished(result: usize, id: u64, shared: *const PoolShared) -> ! {
    let shared = unsafe { &*shared };
    let idx = id as usize;

    let (save, resume) = {
        let mut inner = shared.lock.lock();
        let slot = &mut inner.slots[idx];
        slot.state = FiberState::Done;
        slot.result = result;
        let save = &mut slot.regs as *mut SavedRegs;
        let resume = &inner.slots[0].regs as *const SavedRegs;
        (save, resume)
    };

    if shared.debug {
        kdebug!("fiber {} done, result={:#x}", idx, result);
    }

    unsafe { arch::context_switch(save, resume) };

    kerror!("fiber {}: controller context not resumable, aborting", idx);
    std::process::abort();
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn nop(_arg: usize, _id: FiberId) -> usize {
        0
    }

    #[test]
    fn test_yield_while_locked_is_dropped() {
        let pool = FiberPool::new(PoolConfig::new().capacity(4).stack_size(64 * 1024)).unwrap();
        let id = pool.create(nop, 0).unwrap();

        // With the pool lock held, a yield must return immediately
        // instead of re-locking or switching into the waiting fiber.
        let guard = pool.shared.lock.lock();
        pool.yield_to_next(FiberId::CONTROLLER);
        assert_eq!(guard.slots[id.as_usize()].state, FiberState::Running);
        drop(guard);

        // Once released, the dropped yield is not replayed; the caller
        // makes progress only by yielding again.
        assert_eq!(pool.join(id, FiberId::CONTROLLER), Ok(0));
    }
}
