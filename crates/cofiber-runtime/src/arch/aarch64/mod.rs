//! aarch64 context switching implementation
//!
//! AAPCS64: callee-saved are x19-x28, fp (x29), lr (x30), sp and the
//! low 64 bits of v8-v15 (d8-d15).

use crate::pool::fiber_finished;
use std::arch::naked_asm;

/// Saved execution context: AAPCS64 callee-saved registers plus stack
/// pointer and resume program counter.
///
/// Field order is load-bearing; the asm below addresses fields by offset.
#[repr(C)]
#[derive(Debug, Default)]
pub struct SavedRegs {
    pub sp: u64,  // 0x00
    pub pc: u64,  // 0x08
    pub fp: u64,  // 0x10 (x29)
    pub lr: u64,  // 0x18 (x30)
    pub x19: u64, // 0x20
    pub x20: u64, // 0x28
    pub x21: u64, // 0x30
    pub x22: u64, // 0x38
    pub x23: u64, // 0x40
    pub x24: u64, // 0x48
    pub x25: u64, // 0x50
    pub x26: u64, // 0x58
    pub x27: u64, // 0x60
    pub x28: u64, // 0x68
    pub d8: u64,  // 0x70
    pub d9: u64,  // 0x78
    pub d10: u64, // 0x80
    pub d11: u64, // 0x88
    pub d12: u64, // 0x90
    pub d13: u64, // 0x98
    pub d14: u64, // 0xA0
    pub d15: u64, // 0xA8
}

/// Initialize a new fiber's context
///
/// Seeds the stack top with the fiber id and fills `regs` so that
/// switching into it starts the entry trampoline: x19 = entry fn,
/// x20 = argument, x21 = id, x22 = pool address. The exit landing is the
/// instruction after the trampoline's `blr`, reached through the link
/// register; x21/x22 are callee-saved, so the landing still sees the id
/// and pool address when the entry function returns.
///
/// # Safety
///
/// `regs` must point to valid SavedRegs storage. `stack_top` must be the
/// high end of a writable stack at least 16 bytes deep.
pub unsafe fn init_context(
    regs: *mut SavedRegs,
    stack_top: *mut u8,
    entry_fn: usize,
    entry_arg: usize,
    id: u32,
    pool: usize,
) {
    // sp must stay 16-byte aligned at all times on aarch64
    let top = (stack_top as usize) & !0xF;

    // Fiber id at the top boundary, same layout contract as x86_64
    *((top - 16) as *mut u64) = id as u64;

    let regs = &mut *regs;
    *regs = SavedRegs::default();
    regs.sp = (top - 16) as u64;
    regs.pc = fiber_entry_trampoline as usize as u64;
    regs.x19 = entry_fn as u64;
    regs.x20 = entry_arg as u64;
    regs.x21 = id as u64;
    regs.x22 = pool as u64;
}

/// Entry shim and exit landing. `blr` gives the entry function a return
/// address pointing at the landing below it; the landing forwards the
/// return value (x0), id and pool address to `fiber_finished`, which
/// never returns here.
#[unsafe(naked)]
pub unsafe extern "C" fn fiber_entry_trampoline() {
    naked_asm!(
        "mov x0, x20",
        "mov x1, x21",
        "blr x19",
        // Exit landing: entry returned; x21/x22 survived the call
        "mov x1, x21",
        "mov x2, x22",
        "bl {finished}",
        "brk #0x1",
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
        // Save into `save` (x0)
        "mov x2, sp",
        "str x2, [x0, #0x00]",
        "adr x2, 1f",
        "str x2, [x0, #0x08]",
        "stp x29, x30, [x0, #0x10]",
        "stp x19, x20, [x0, #0x20]",
        "stp x21, x22, [x0, #0x30]",
        "stp x23, x24, [x0, #0x40]",
        "stp x25, x26, [x0, #0x50]",
        "stp x27, x28, [x0, #0x60]",
        "stp d8, d9, [x0, #0x70]",
        "stp d10, d11, [x0, #0x80]",
        "stp d12, d13, [x0, #0x90]",
        "stp d14, d15, [x0, #0xA0]",
        // Load from `resume` (x1)
        "ldr x2, [x1, #0x00]",
        "mov sp, x2",
        "ldr x3, [x1, #0x08]",
        "ldp x29, x30, [x1, #0x10]",
        "ldp x19, x20, [x1, #0x20]",
        "ldp x21, x22, [x1, #0x30]",
        "ldp x23, x24, [x1, #0x40]",
        "ldp x25, x26, [x1, #0x50]",
        "ldp x27, x28, [x1, #0x60]",
        "ldp d8, d9, [x1, #0x70]",
        "ldp d10, d11, [x1, #0x80]",
        "ldp d12, d13, [x1, #0x90]",
        "ldp d14, d15, [x1, #0xA0]",
        // Jump to new PC
        "br x3",
        // Return point for the saved context
        "1:",
        "ret",
    );
}
