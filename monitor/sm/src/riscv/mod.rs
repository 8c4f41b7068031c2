//! RISC-V backend

mod hart;
mod init;
pub mod platform;
pub mod trap;

use core::arch::asm;

pub use hart::MachineHart;
pub use init::{sm_entry, SmManifest};
use riscv_csrs::mstatus;
use riscv_utils::{read_mhartid, read_mstatus, write_mepc, write_mstatus, write_satp, write_stvec};

/// Drops to the untrusted supervisor at `next_addr`, with `a0 = hartid` and `a1 = arg1`.
pub fn launch_host(hartid: usize, arg1: usize, next_addr: usize) -> ! {
    log::info!("Launching host on hart {} at {:#x}", hartid, next_addr);

    // MPP = S-mode, MPIE = 0.
    let mut status = read_mstatus();
    status &= !(mstatus::MPP_MASK << mstatus::MPP_LOW);
    status |= 1 << mstatus::MPP_LOW;
    status &= !(1 << mstatus::MPIE);
    write_mstatus(status);

    write_mepc(next_addr);
    write_stvec(next_addr);
    write_satp(0);

    unsafe {
        asm!(
            "csrw sscratch, zero",
            "csrw sie, zero",
            "mret",
            in("a0") hartid,
            in("a1") arg1,
            options(noreturn)
        );
    }
}

/// Halt the CPU in a spinloop;
pub fn hlt() -> ! {
    loop {
        unsafe { asm!("wfi", options(nomem, nostack)) }
    }
}

pub fn cpuid() -> usize {
    read_mhartid()
}
