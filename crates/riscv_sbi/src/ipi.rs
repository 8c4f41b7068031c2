//! Machine software interrupts through the ACLINT MSWI device.

#[cfg(target_arch = "riscv64")]
use core::arch::asm;

#[cfg(target_arch = "riscv64")]
use riscv_utils::{ACLINT_MSWI_BASE_ADDR, ACLINT_MSWI_WORD_SIZE};

#[cfg(target_arch = "riscv64")]
pub fn aclint_mswi_send_ipi(target_hartid: usize) {
    let target_addr: usize = ACLINT_MSWI_BASE_ADDR + target_hartid * ACLINT_MSWI_WORD_SIZE;
    unsafe {
        asm!("sw {}, 0({})", in(reg) 1, in(reg) target_addr);
    }
}

#[cfg(target_arch = "riscv64")]
pub fn aclint_mswi_clear_ipi(target_hartid: usize) {
    let target_addr: usize = ACLINT_MSWI_BASE_ADDR + target_hartid * ACLINT_MSWI_WORD_SIZE;
    unsafe {
        asm!("sw {}, 0({})", in(reg) 0, in(reg) target_addr);
    }
}

/// Sends a machine software interrupt to every hart of the mask.
#[cfg(target_arch = "riscv64")]
pub fn aclint_mswi_send_mask(mut harts: usize) {
    while harts != 0 {
        let hart = harts.trailing_zeros() as usize;
        aclint_mswi_send_ipi(hart);
        harts &= harts - 1;
    }
}
