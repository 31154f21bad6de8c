//! Architecture-specific context switching
//!
//! Each architecture provides the same narrow surface: a `SavedRegs`
//! snapshot type, `init_context` to seed a fresh fiber, and the
//! `context_switch` primitive. Everything unsafe and
//! architecture-specific lives behind these three items; the pool,
//! scheduler and stack builder are arch-free.

cfg_if::cfg_if! {
    if #[cfg(target_arch = "x86_64")] {
        pub mod x86_64;
        pub use x86_64::{SavedRegs, context_switch, init_context};
    } else if #[cfg(target_arch = "aarch64")] {
        pub mod aarch64;
        pub use aarch64::{SavedRegs, context_switch, init_context};
    } else {
        compile_error!("unsupported architecture: cofiber needs x86_64 or aarch64");
    }
}
