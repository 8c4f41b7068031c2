//! Raw access to the PMP CSRs of the current hart.

#[cfg(target_arch = "riscv64")]
use core::arch::asm;

#[cfg(target_arch = "riscv64")]
use crate::{pmpcfg_extract, pmpcfg_insert, PMP_ENTRIES};

#[cfg(target_arch = "riscv64")]
macro_rules! pmpaddr_match {
    ($index:expr, $op:ident, $value:ident, $($n:literal),*) => {
        match $index {
            $($n => pmpaddr_match!(@$op $n, $value),)*
            _ => log::debug!("Invalid pmpaddr index {}", $index),
        }
    };
    (@read $n:literal, $value:ident) => {
        unsafe { asm!(concat!("csrr {}, pmpaddr", $n), out(reg) $value) }
    };
    (@write $n:literal, $value:ident) => {
        unsafe { asm!(concat!("csrw pmpaddr", $n, ", {}"), in(reg) $value) }
    };
}

#[cfg(target_arch = "riscv64")]
pub fn pmpaddr_csr_read(index: usize) -> usize {
    let mut value: usize = 0;
    pmpaddr_match!(index, read, value, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15);
    value
}

#[cfg(target_arch = "riscv64")]
pub fn pmpaddr_csr_write(index: usize, value: usize) {
    pmpaddr_match!(index, write, value, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15);
}

/// Reads the `pmpcfg` CSR holding entry `index` (pmpcfg0 or pmpcfg2 on RV64).
#[cfg(target_arch = "riscv64")]
pub fn pmpcfg_csr_read(index: usize) -> usize {
    let value: usize;
    if index < 8 {
        unsafe { asm!("csrr {}, pmpcfg0", out(reg) value) };
    } else {
        unsafe { asm!("csrr {}, pmpcfg2", out(reg) value) };
    }
    value
}

#[cfg(target_arch = "riscv64")]
pub fn pmpcfg_csr_write(index: usize, value: usize) {
    if index < 8 {
        unsafe { asm!("csrw pmpcfg0, {}", in(reg) value) };
    } else {
        unsafe { asm!("csrw pmpcfg2, {}", in(reg) value) };
    }
}

/// Programs one entry: address first, then its configuration byte.
#[cfg(target_arch = "riscv64")]
pub fn pmp_write_entry(index: usize, pmpaddr: usize, cfg: u8) {
    if index >= PMP_ENTRIES {
        log::debug!("Invalid PMP index {}", index);
        return;
    }
    log::trace!("Writing PMP entry {}: addr {:x} cfg {:x}", index, pmpaddr, cfg);
    pmpaddr_csr_write(index, pmpaddr);
    let pmpcfg = pmpcfg_insert(pmpcfg_csr_read(index), index, cfg);
    pmpcfg_csr_write(index, pmpcfg);

    //Sfence after writing the PMP.
    unsafe {
        asm!("sfence.vma");
    }
}

#[cfg(target_arch = "riscv64")]
pub fn pmp_read_cfg(index: usize) -> u8 {
    pmpcfg_extract(pmpcfg_csr_read(index), index)
}
