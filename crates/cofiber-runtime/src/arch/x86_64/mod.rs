//! x86_64 context switching implementation
//!
//! Uses inline assembly for context switch.
//! Stable in Rust 1.88+

use crate::pool::fiber_finished;
use std::arch::naked_asm;

/// Saved execution context: the callee-saved register set of the System V
/// AMD64 ABI plus stack pointer and resume instruction pointer.
///
/// Field order is load-bearing; the asm below addresses fields by offset.
#[repr(C)]
#[derive(Debug, Default)]
pub struct SavedRegs {
    pub rsp: u64, // 0x00
    pub rip: u64, // 0x08
    pub rbx: u64, // 0x10
    pub rbp: u64, // 0x18
    pub r12: u64, // 0x20
    pub r13: u64, // 0x28
    pub r14: u64, // 0x30
    pub r15: u64, // 0x38
}

/// Initialize a new fiber's context
///
/// Seeds the stack top (descending) with the fiber id and the exit
/// landing address, then fills `regs` so that switching into it starts
/// the entry trampoline: r12 = entry fn, r13 = argument, r14 = id,
/// r15 = pool address.
///
/// # Safety
///
/// `regs` must point to valid SavedRegs storage. `stack_top` must be the
/// high end of a writable stack at least 32 bytes deep.
pub unsafe fn init_context(
    regs: *mut SavedRegs,
    stack_top: *mut u8,
    entry_fn: usize,
    entry_arg: usize,
    id: u32,
    pool: usize,
) {
    // Stack must be 16-byte aligned per System V AMD64 ABI
    let top = (stack_top as usize) & !0xF;

    // Fiber id at the top boundary; the exit landing reads it back from
    // [rsp] after the entry function's `ret` pops the word below it.
    *((top - 16) as *mut u64) = id as u64;
    *((top - 24) as *mut u64) = fiber_exit_trampoline as usize as u64;

    let regs = &mut *regs;
    // rsp % 16 == 8 at entry, as if reached by a call
    regs.rsp = (top - 24) as u64;
    regs.rip = fiber_entry_trampoline as usize as u64;
    regs.rbx = 0;
    regs.rbp = 0;
    regs.r12 = entry_fn as u64;
    regs.r13 = entry_arg as u64;
    regs.r14 = id as u64;
    regs.r15 = pool as u64;
}

/// Entry shim: moves the staged argument and id into the C calling
/// convention and jumps (not calls) to the entry function, so the seeded
/// exit landing word becomes its return address.
#[unsafe(naked)]
pub unsafe extern "C" fn fiber_entry_trampoline() {
    naked_asm!(
        "mov rdi, r13",
        "mov rsi, r14",
        "jmp r12",
    );
}

/// Exit landing: reached only by the entry function returning into the
/// seeded word. rax carries the return value, [rsp] the fiber id, r15
/// (callee-saved, so still intact) the pool address. Hands off to
/// `fiber_finished`, which never returns here.
#[unsafe(naked)]
pub unsafe extern "C" fn fiber_exit_trampoline() {
    naked_asm!(
        "mov rdi, rax",
        "mov rsi, [rsp]",
        "mov rdx, r15",
        "call {finished}",
        "ud2",
        finished = sym fiber_finished,
    );
}

/// Perform a voluntary context switch
///
/// Saves callee-saved registers into `save` and loads from `resume`.
/// Control returns to the caller only when some other fiber later
/// switches back into `save`.
#[unsafe(naked)]
pub unsafe extern "C" fn context_switch(
    _save: *mut SavedRegs,
    _resume: *const SavedRegs,
) {
    naked_asm!(
        // Save callee-saved registers into `save` (RDI)
        "mov [rdi + 0x00], rsp",
        "lea rax, [rip + 1f]",
        "mov [rdi + 0x08], rax",
        "mov [rdi + 0x10], rbx",
        "mov [rdi + 0x18], rbp",
        "mov [rdi + 0x20], r12",
        "mov [rdi + 0x28], r13",
        "mov [rdi + 0x30], r14",
        "mov [rdi + 0x38], r15",
        // Load callee-saved registers from `resume` (RSI)
        "mov rsp, [rsi + 0x00]",
        "mov rax, [rsi + 0x08]",
        "mov rbx, [rsi + 0x10]",
        "mov rbp, [rsi + 0x18]",
        "mov r12, [rsi + 0x20]",
        "mov r13, [rsi + 0x28]",
        "mov r14, [rsi + 0x30]",
        "mov r15, [rsi + 0x38]",
        // Jump to new RIP
        "jmp rax",
        // Return point for the saved context
        "1:",
        "ret",
    );
}
