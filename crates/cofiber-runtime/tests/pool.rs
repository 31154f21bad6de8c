//! Fiber pool integration tests
//!
//! Each test builds its own pool on its own test thread; a pool is bound
//! to the thread that created it, so the tests are independent even
//! under the parallel test harness.

use cofiber_core::error::{FiberError, MemoryError};
use cofiber_core::id::FiberId;
use cofiber_core::state::FiberState;
use cofiber_runtime::{FiberPool, PoolConfig};
use std::cell::UnsafeCell;

const TEST_STACK: usize = 256 * 1024;

fn test_pool(capacity: usize) -> FiberPool {
    FiberPool::new(PoolConfig::new().capacity(capacity).stack_size(TEST_STACK))
        .expect("pool construction failed")
}

extern "C" fn nop(_arg: usize, _id: FiberId) -> usize {
    0
}

extern "C" fn add_one(arg: usize, _id: FiberId) -> usize {
    arg + 1
}

extern "C" fn echo_arg(arg: usize, _id: FiberId) -> usize {
    arg
}

#[test]
fn create_succeeds_until_capacity_then_exhausts() {
    let pool = test_pool(4);

    // Slot 0 is the controller, so capacity-1 creates fit
    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(pool.create(nop, 0).expect("create within capacity failed"));
    }
    assert_eq!(pool.create(nop, 0), Err(FiberError::PoolExhausted));

    // Ids are distinct and never 0
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);
    assert!(ids.iter().all(|id| !id.is_controller()));
}

#[test]
fn run_to_completion_and_join_returns_value() {
    let pool = test_pool(4);

    let id = pool.create(add_one, 41).unwrap();
    assert_eq!(pool.state(id).unwrap(), FiberState::Running);

    let result = pool.join(id, FiberId::CONTROLLER).unwrap();
    assert_eq!(result, 42);
    assert_eq!(pool.state(id).unwrap(), FiberState::Free);
}

#[test]
fn join_invalid_targets() {
    let pool = test_pool(8);

    // Never created
    assert_eq!(
        pool.join(FiberId::new(3), FiberId::CONTROLLER),
        Err(FiberError::InvalidTarget)
    );
    // Out of range
    assert_eq!(
        pool.join(FiberId::new(99), FiberId::CONTROLLER),
        Err(FiberError::InvalidTarget)
    );
    // The controller can never finish
    assert_eq!(
        pool.join(FiberId::CONTROLLER, FiberId::CONTROLLER),
        Err(FiberError::InvalidTarget)
    );
    // A fiber cannot wait on itself
    assert_eq!(
        pool.join(FiberId::new(2), FiberId::new(2)),
        Err(FiberError::InvalidTarget)
    );
}

#[test]
fn second_join_after_reclamation_fails() {
    let pool = test_pool(4);

    let id = pool.create(echo_arg, 7).unwrap();
    assert_eq!(pool.join(id, FiberId::CONTROLLER), Ok(7));
    // The slot no longer identifies that fiber
    assert_eq!(
        pool.join(id, FiberId::CONTROLLER),
        Err(FiberError::InvalidTarget)
    );
}

struct LogCtx {
    pool: *const FiberPool,
    log: *mut Vec<u32>,
    rounds: usize,
}

extern "C" fn log_and_yield(arg: usize, id: FiberId) -> usize {
    let ctx = unsafe { &*(arg as *const LogCtx) };
    let pool = unsafe { &*ctx.pool };
    for _ in 0..ctx.rounds {
        unsafe { (*ctx.log).push(id.as_u32()) };
        pool.yield_to_next(id);
    }
    id.as_usize()
}

#[test]
fn round_robin_rotation_order() {
    let pool = test_pool(8);
    let log: UnsafeCell<Vec<u32>> = UnsafeCell::new(Vec::new());

    let rounds = 4;
    let ctxs: Vec<LogCtx> = (0..3)
        .map(|_| LogCtx {
            pool: &pool,
            log: log.get(),
            rounds,
        })
        .collect();

    let ids: Vec<FiberId> = ctxs
        .iter()
        .map(|c| pool.create(log_and_yield, c as *const LogCtx as usize).unwrap())
        .collect();

    for id in &ids {
        let result = pool.join(*id, FiberId::CONTROLLER).unwrap();
        assert_eq!(result, id.as_usize());
    }

    // With every fiber yielding once per round, resumptions form the
    // creation-order cycle repeated `rounds` times; the controller's
    // position in the rotation never reorders the fibers.
    let observed = unsafe { &*log.get() };
    let cycle: Vec<u32> = ids.iter().map(|id| id.as_u32()).collect();
    let expected: Vec<u32> = cycle
        .iter()
        .cycle()
        .take(cycle.len() * rounds)
        .copied()
        .collect();
    assert_eq!(*observed, expected);
}

#[test]
fn rotation_independent_of_join_order() {
    let pool = test_pool(8);
    let log: UnsafeCell<Vec<u32>> = UnsafeCell::new(Vec::new());

    let rounds = 3;
    let ctxs: Vec<LogCtx> = (0..3)
        .map(|_| LogCtx {
            pool: &pool,
            log: log.get(),
            rounds,
        })
        .collect();

    let ids: Vec<FiberId> = ctxs
        .iter()
        .map(|c| pool.create(log_and_yield, c as *const LogCtx as usize).unwrap())
        .collect();

    // Join back to front; the relative rotation order must not change
    for id in ids.iter().rev() {
        pool.join(*id, FiberId::CONTROLLER).unwrap();
    }

    let observed = unsafe { &*log.get() };
    let cycle: Vec<u32> = ids.iter().map(|id| id.as_u32()).collect();
    let expected: Vec<u32> = cycle
        .iter()
        .cycle()
        .take(cycle.len() * rounds)
        .copied()
        .collect();
    assert_eq!(*observed, expected);
}

#[test]
fn reclaimed_slot_is_reused_fresh() {
    let pool = test_pool(4);

    let first = pool.create(echo_arg, 100).unwrap();
    assert_eq!(pool.join(first, FiberId::CONTROLLER), Ok(100));

    // The lowest free slot is handed out again
    let second = pool.create(add_one, 200).unwrap();
    assert_eq!(second, first);
    // The new occupant runs on a fresh stack and sees only its own state
    assert_eq!(pool.join(second, FiberId::CONTROLLER), Ok(201));
}

struct SpawnCtx {
    pool: *const FiberPool,
}

extern "C" fn doubler(arg: usize, _id: FiberId) -> usize {
    arg * 2
}

extern "C" fn parent(arg: usize, id: FiberId) -> usize {
    let ctx = unsafe { &*(arg as *const SpawnCtx) };
    let pool = unsafe { &*ctx.pool };
    // Interleaves create and join with the controller's own join loop
    let child = pool.create(doubler, 21).unwrap();
    pool.join(child, id).unwrap()
}

#[test]
fn create_and_join_from_inside_a_fiber() {
    let pool = test_pool(8);
    let ctx = SpawnCtx { pool: &pool };

    let p = pool.create(parent, &ctx as *const SpawnCtx as usize).unwrap();
    assert_eq!(pool.join(p, FiberId::CONTROLLER), Ok(42));

    // The table is consistent afterwards: both slots reclaimed
    for idx in 1..pool.capacity() {
        assert_eq!(pool.state(FiberId::new(idx as u32)).unwrap(), FiberState::Free);
    }
}

#[test]
fn bad_stack_size_fails_create_and_rolls_back() {
    let pool = FiberPool::new(PoolConfig::new().capacity(4).stack_size(12345))
        .expect("pool construction failed");

    // Both attempts report the memory error, not PoolExhausted: the slot
    // claimed by the failed create was rolled back to Free
    for _ in 0..2 {
        assert_eq!(
            pool.create(nop, 0),
            Err(FiberError::Memory(MemoryError::BadStackSize))
        );
    }
    assert_eq!(pool.state(FiberId::new(1)).unwrap(), FiberState::Free);
}

struct GreetCtx {
    pool: *const FiberPool,
    log: *mut Vec<String>,
}

extern "C" fn greeter(arg: usize, id: FiberId) -> usize {
    let ctx = unsafe { &*(arg as *const GreetCtx) };
    let pool = unsafe { &*ctx.pool };
    for _ in 0..3 {
        unsafe { (*ctx.log).push(format!("hello from id={}", id)) };
        pool.yield_to_next(id);
    }
    arg
}

#[test]
fn end_to_end_greeting_scenario() {
    let pool = test_pool(8);
    let log: UnsafeCell<Vec<String>> = UnsafeCell::new(Vec::new());

    let ctxs: Vec<GreetCtx> = (0..4)
        .map(|_| GreetCtx {
            pool: &pool,
            log: log.get(),
        })
        .collect();

    let ids: Vec<FiberId> = ctxs
        .iter()
        .map(|c| pool.create(greeter, c as *const GreetCtx as usize).unwrap())
        .collect();

    pool.yield_to_next(FiberId::CONTROLLER);

    // Join in scrambled order; each returns the argument it was given
    for &pick in &[2usize, 0, 3, 1] {
        let expected = &ctxs[pick] as *const GreetCtx as usize;
        assert_eq!(pool.join(ids[pick], FiberId::CONTROLLER), Ok(expected));
    }

    let observed = unsafe { &*log.get() };
    assert_eq!(observed.len(), 4 * 3);
    for id in &ids {
        let line = format!("hello from id={}", id);
        assert_eq!(observed.iter().filter(|l| **l == line).count(), 3);
    }
}

#[test]
fn yield_with_no_other_runnable_fiber_returns() {
    let pool = test_pool(4);
    // Nothing to switch to; must return immediately instead of hanging
    pool.yield_to_next(FiberId::CONTROLLER);

    let id = pool.create(echo_arg, 1).unwrap();
    pool.join(id, FiberId::CONTROLLER).unwrap();
    pool.yield_to_next(FiberId::CONTROLLER);
}
