//! CSR accessors for the hart the monitor runs on.
//!
//! Everything here compiles to nothing outside of `riscv64`, host builds only need the constants
//! and the register state.

#[cfg(target_arch = "riscv64")]
use core::arch::asm;

macro_rules! csr_rw {
    ($($csr:ident => $read:ident, $write:ident;)*) => {
        $(
            #[cfg(target_arch = "riscv64")]
            #[inline]
            pub fn $read() -> usize {
                let value: usize;
                unsafe { asm!(concat!("csrr {}, ", stringify!($csr)), out(reg) value) };
                value
            }

            #[cfg(target_arch = "riscv64")]
            #[inline]
            pub fn $write(value: usize) {
                unsafe { asm!(concat!("csrw ", stringify!($csr), ", {}"), in(reg) value) };
            }
        )*
    };
}

macro_rules! csr_bits {
    ($($csr:ident => $set:ident, $clear:ident;)*) => {
        $(
            #[cfg(target_arch = "riscv64")]
            #[inline]
            pub fn $set(bits: usize) {
                unsafe { asm!(concat!("csrs ", stringify!($csr), ", {}"), in(reg) bits) };
            }

            #[cfg(target_arch = "riscv64")]
            #[inline]
            pub fn $clear(bits: usize) {
                unsafe { asm!(concat!("csrc ", stringify!($csr), ", {}"), in(reg) bits) };
            }
        )*
    };
}

csr_rw! {
    satp => read_satp, write_satp;
    stvec => read_stvec, write_stvec;
    sepc => read_sepc, write_sepc;
    mepc => read_mepc, write_mepc;
    mtvec => read_mtvec, write_mtvec;
    mscratch => read_mscratch, write_mscratch;
    mstatus => read_mstatus, write_mstatus;
    mcause => read_mcause, write_mcause;
    mtval => read_mtval, write_mtval;
    medeleg => read_medeleg, write_medeleg;
    mideleg => read_mideleg, write_mideleg;
}

csr_bits! {
    mie => set_mie, clear_mie;
    mip => set_mip, clear_mip;
}

#[cfg(target_arch = "riscv64")]
pub fn read_mhartid() -> usize {
    let hartid: usize;
    unsafe { asm!("csrr {}, mhartid", out(reg) hartid) };
    hartid
}

#[cfg(target_arch = "riscv64")]
pub fn local_sfence_vma() {
    unsafe { asm!("sfence.vma") };
}
