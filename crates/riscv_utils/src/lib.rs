#![cfg_attr(not(test), no_std)]

//! Low level RISC-V helpers shared by the security monitor crates: the trap frame layout,
//! platform constants and CSR accessors.

pub mod csr;

#[cfg(target_arch = "riscv64")]
use core::arch::asm;

pub use csr::*;

pub const NUM_HARTS: usize = 8;

pub const PAGE_SHIFT: usize = 12;
pub const PAGE_SIZE: usize = 1 << PAGE_SHIFT;

//ACLINT machine software interrupt device (qemu virt).
pub const ACLINT_MSWI_BASE_ADDR: usize = 0x200_0000;
pub const ACLINT_MSWI_WORD_SIZE: usize = 4;

//ACLINT machine timer compare registers (qemu virt).
pub const ACLINT_MTIMECMP_BASE_ADDR: usize = 0x200_4000;
pub const ACLINT_MTIMECMP_SIZE: usize = 8;

//uart base address
pub const SERIAL_PORT_BASE_ADDRESS: usize = 0x1000_0000;

/// Programs the machine timer compare value of `hartid`.
#[cfg(target_arch = "riscv64")]
pub fn aclint_mtimer_set_mtimecmp(hartid: usize, value: usize) {
    let target_addr: usize = ACLINT_MTIMECMP_BASE_ADDR + hartid * ACLINT_MTIMECMP_SIZE;
    unsafe {
        asm!("sd {}, 0({})", in(reg) value, in(reg) target_addr);
    }
}

// ————————————————————————————— Register State ————————————————————————————— //

/// General purpose registers of a trapped hart, in the order the machine trap handler spills
/// them (x0 to x31).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegisterState {
    pub zero: usize,
    pub ra: usize,
    pub sp: usize,
    pub gp: usize,
    pub tp: usize,
    pub t0: usize,
    pub t1: usize,
    pub t2: usize,
    pub s0: usize,
    pub s1: usize,
    pub a0: usize,
    pub a1: usize,
    pub a2: usize,
    pub a3: usize,
    pub a4: usize,
    pub a5: usize,
    pub a6: usize,
    pub a7: usize,
    pub s2: usize,
    pub s3: usize,
    pub s4: usize,
    pub s5: usize,
    pub s6: usize,
    pub s7: usize,
    pub s8: usize,
    pub s9: usize,
    pub s10: usize,
    pub s11: usize,
    pub t3: usize,
    pub t4: usize,
    pub t5: usize,
    pub t6: usize,
}

impl RegisterState {
    pub const fn zeroed() -> Self {
        RegisterState {
            zero: 0,
            ra: 0,
            sp: 0,
            gp: 0,
            tp: 0,
            t0: 0,
            t1: 0,
            t2: 0,
            s0: 0,
            s1: 0,
            a0: 0,
            a1: 0,
            a2: 0,
            a3: 0,
            a4: 0,
            a5: 0,
            a6: 0,
            a7: 0,
            s2: 0,
            s3: 0,
            s4: 0,
            s5: 0,
            s6: 0,
            s7: 0,
            s8: 0,
            s9: 0,
            s10: 0,
            s11: 0,
            t3: 0,
            t4: 0,
            t5: 0,
            t6: 0,
        }
    }

    /// Arguments of an SBI call, a0 to a5.
    pub fn sbi_args(&self) -> [usize; 6] {
        [self.a0, self.a1, self.a2, self.a3, self.a4, self.a5]
    }
}

// ————————————————————————————————— Tests —————————————————————————————————— //
