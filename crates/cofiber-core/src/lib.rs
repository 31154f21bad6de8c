//! # cofiber-core
//!
//! Core types for the cofiber cooperative (non-preemptive) fiber scheduler.
//!
//! This crate is platform-agnostic and contains no OS-specific code.
//! All platform-specific pieces (stack mapping, context switching) live
//! in `cofiber-runtime`.
//!
//! ## Modules
//!
//! - `id` - Fiber identifier type
//! - `state` - Fiber slot state enum
//! - `error` - Error types
//! - `spinlock` - The global pool lock primitive
//! - `kprint` - Kernel-style debug printing macros
//! - `env` - Environment variable utilities

#![allow(dead_code)]

pub mod env;
pub mod error;
pub mod id;
pub mod kprint;
pub mod spinlock;
pub mod state;

// Re-exports for convenience
pub use env::{env_get, env_get_bool};
pub use error::{FiberError, FiberResult, MemoryError};
pub use id::FiberId;
pub use spinlock::SpinLock;
pub use state::FiberState;

/// Constants shared across the workspace
pub mod constants {
    /// Default pool capacity, including the reserved controller slot 0
    pub const DEFAULT_MAX_FIBERS: usize = 64;

    /// Hard upper bound on pool capacity
    pub const MAX_FIBERS: usize = 4096;

    /// Default usable stack size per fiber (4 MiB)
    pub const DEFAULT_STACK_SIZE: usize = 4 * 1024 * 1024;

    /// Guard page size at the low end of every fiber stack
    pub const GUARD_SIZE: usize = 4096;

    /// Page size assumed for stack-size validation
    pub const PAGE_SIZE: usize = 4096;
}
