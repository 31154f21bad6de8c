//! # cofiber - Cooperative Fiber Runtime
//!
//! A minimal cooperative (non-preemptive) user-level threading runtime
//! for a single CPU core: a fixed-capacity pool of independently-stacked
//! fibers, a round-robin scheduler driven entirely by voluntary yields,
//! and a join primitive. One hardware thread; interleaving, never
//! parallelism.
//!
//! ## Features
//!
//! - **Lightweight**: mmap'd per-fiber stacks with guard pages,
//!   physical memory on demand
//! - **Fast context switch**: voluntary yield via hand-written
//!   callee-saved-register assembly (x86_64, aarch64)
//! - **Strict round-robin**: circular scan from the yielder's successor
//!   is the entire fairness policy
//! - **Join + reclaim**: a joined fiber's slot, stack and id are
//!   recycled
//! - **Explicit errors**: pool exhaustion and allocation failures are
//!   `Result`s, not process exits
//!
//! ## Quick Start
//!
//! ```ignore
//! use cofiber::{FiberPool, PoolConfig, FiberId};
//!
//! extern "C" fn worker(arg: usize, id: FiberId) -> usize {
//!     println!("hello from fiber {}", id);
//!     arg * 2
//! }
//!
//! fn main() {
//!     let pool = FiberPool::new(PoolConfig::from_env()).unwrap();
//!     let id = pool.create(worker, 21).unwrap();
//!     let result = pool.join(id, FiberId::CONTROLLER).unwrap();
//!     assert_eq!(result, 42);
//! }
//! ```
//!
//! ## What this is not
//!
//! There is no preemption: a fiber that never yields and never returns
//! starves every other fiber and the controller permanently. There is no
//! cancellation; the only way a fiber ends is by returning from its
//! entry function.

// Re-export core types
pub use cofiber_core::{FiberError, FiberId, FiberResult, FiberState, MemoryError, SpinLock};

// Re-export kprint macros for debug logging
pub use cofiber_core::kprint::{
    init as init_logging, set_flush_enabled, set_log_level, LogLevel,
};
pub use cofiber_core::{kdebug, kerror, kinfo, kprintln, kwarn};

// Re-export env utilities
pub use cofiber_core::{env_get, env_get_bool};

// Re-export runtime types
pub use cofiber_runtime::{FiberEntry, FiberPool, PoolConfig};
