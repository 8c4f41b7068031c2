//! # Statically allocated structures

// ————————————————————— Static Resources Configuration ————————————————————— //

/// Physical memory of the monitor itself, never accessible to the host or enclaves.
pub const SM_START_ADDRESS: usize = 0x8000_0000;
pub const SM_SIZE: usize = 0x20_0000;

/// Machine mode stack of each hart.
pub const STACK_SIZE: usize = 0x4000;

/// `[base, base + size)` intersects monitor memory.
pub fn touches_monitor(base: usize, size: usize) -> bool {
    let end = base as u128 + size as u128;
    (base as u128) < (SM_START_ADDRESS + SM_SIZE) as u128 && end > SM_START_ADDRESS as u128
}

// ———————————————————————————— Monitor Instance ———————————————————————————— //

#[cfg(target_arch = "riscv64")]
pub use self::instance::*;

#[cfg(target_arch = "riscv64")]
mod instance {
    use enclave_engine::EnclaveEngine;
    use riscv_utils::NUM_HARTS;

    use super::STACK_SIZE;
    use crate::riscv::platform::RiscvPlatform;

    pub static ENGINE: EnclaveEngine<RiscvPlatform> = EnclaveEngine::new(RiscvPlatform::new());

    #[repr(C, align(16))]
    pub struct HartStacks(pub [[u8; STACK_SIZE]; NUM_HARTS]);

    pub static mut HART_STACKS: HartStacks = HartStacks([[0; STACK_SIZE]; NUM_HARTS]);
}

// ————————————————————————————————— Tests —————————————————————————————————— //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitor_memory() {
        assert!(touches_monitor(SM_START_ADDRESS, 0x1000));
        assert!(touches_monitor(SM_START_ADDRESS + SM_SIZE - 8, 8));
        assert!(touches_monitor(0, usize::MAX));
        assert!(!touches_monitor(SM_START_ADDRESS + SM_SIZE, 0x1000));
        assert!(!touches_monitor(SM_START_ADDRESS - 0x1000, 0x1000));
    }
}
