//! # cofiber-runtime
//!
//! Platform-specific runtime for the cofiber cooperative scheduler.
//!
//! This crate provides:
//! - Fiber stack allocation (mmap with a guard page)
//! - Context switching (architecture-specific naked assembly)
//! - The fiber pool: create / yield / join / reclaim
//!
//! Only 64-bit architectures with a downward-growing stack are
//! supported (x86_64 and aarch64 on unix).

#![allow(dead_code)]

pub mod arch;
pub mod config;
pub mod pool;
pub mod stack;

// Re-exports
pub use arch::SavedRegs;
pub use config::PoolConfig;
pub use pool::{FiberEntry, FiberPool};
pub use stack::FiberStack;

#[cfg(not(unix))]
compile_error!("cofiber-runtime requires a unix platform (mmap stacks)");
