//! Platform services backed by the hardware: PMP, physical memory and page table walks.

use core::ptr;

use enclave_engine::{
    HostMemory, HostMemoryError, PageTableError, PageTableValidator, RegionDriver, RegionError,
    RegionId, RegionPriority,
};
use riscv_pmp::csrs::pmp_write_entry;
use riscv_pmp::{PMPErrorCode, PmpBackend, PmpRegions};
use riscv_sbi::ipi::aclint_mswi_send_mask;

use crate::pgtable::{PhysMemory, Sv39Validator};
use crate::statics::touches_monitor;

/// Programs the PMP CSRs of the current hart, and reaches the others through software
/// interrupts.
pub struct MachinePmp;

impl PmpBackend for MachinePmp {
    fn write_entry(&self, _hart: usize, index: usize, pmpaddr: usize, cfg: u8) {
        pmp_write_entry(index, pmpaddr, cfg);
    }

    fn notify(&self, harts: usize) {
        aclint_mswi_send_mask(harts);
    }
}

/// Machine mode view of physical memory.
pub struct MachineMemory;

impl PhysMemory for MachineMemory {
    fn read_pte(&self, addr: usize) -> usize {
        // SAFETY: callers only walk page tables inside enclave memory, which is never mapped
        // into the monitor and is not accessed concurrently while being validated.
        unsafe { ptr::read_volatile(addr as *const usize) }
    }

    fn write_pte(&self, addr: usize, pte: usize) {
        // SAFETY: see `read_pte`.
        unsafe { ptr::write_volatile(addr as *mut usize, pte) }
    }
}

pub struct RiscvPlatform {
    pmp: PmpRegions<MachinePmp>,
    tables: Sv39Validator<MachineMemory>,
}

impl RiscvPlatform {
    pub const fn new() -> Self {
        RiscvPlatform {
            pmp: PmpRegions::new(MachinePmp),
            tables: Sv39Validator::new(MachineMemory),
        }
    }

    pub fn pmp(&self) -> &PmpRegions<MachinePmp> {
        &self.pmp
    }
}

fn region_error(err: PMPErrorCode) -> RegionError {
    match err {
        PMPErrorCode::NoFreeEntry => RegionError::Exhausted,
        PMPErrorCode::NotPageAligned | PMPErrorCode::InvalidRegion => RegionError::InvalidRange,
        _ => RegionError::InvalidRegion,
    }
}

impl RegionDriver for RiscvPlatform {
    fn init_atomic(
        &self,
        base: usize,
        size: usize,
        perm: u8,
        priority: RegionPriority,
    ) -> Result<RegionId, RegionError> {
        if touches_monitor(base, size) {
            log::warn!("Region {:#x} + {:#x} overlaps the monitor", base, size);
            return Err(RegionError::InvalidRange);
        }
        let priority = match priority {
            RegionPriority::Any => riscv_pmp::RegionPriority::Any,
            RegionPriority::Top => riscv_pmp::RegionPriority::Top,
            RegionPriority::Bottom => riscv_pmp::RegionPriority::Bottom,
        };
        self.pmp
            .init_region(base, size, perm, priority)
            .map(RegionId)
            .map_err(region_error)
    }

    fn free_atomic(&self, region: RegionId) {
        if self.pmp.free_region(region.0).is_err() {
            panic!("Double free of PMP region {}", region.0);
        }
    }

    fn set_global(&self, hart: usize, region: RegionId) -> Result<(), RegionError> {
        self.pmp.set_global(hart, region.0).map_err(region_error)
    }

    fn unset_global(&self, hart: usize, region: RegionId) -> Result<(), RegionError> {
        self.pmp.unset_global(hart, region.0).map_err(region_error)
    }

    fn set(&self, hart: usize, region: RegionId) {
        if let Err(err) = self.pmp.set_local(hart, region.0) {
            log::error!("Failed to enforce PMP region {}: {:?}", region.0, err);
        }
    }

    fn unset(&self, hart: usize, region: RegionId) {
        if let Err(err) = self.pmp.unset_local(hart, region.0) {
            log::error!("Failed to lift PMP region {}: {:?}", region.0, err);
        }
    }

    fn base(&self, region: RegionId) -> usize {
        self.pmp.region_bounds(region.0).map_or(0, |(base, _)| base)
    }

    fn size(&self, region: RegionId) -> usize {
        self.pmp.region_bounds(region.0).map_or(0, |(_, size)| size)
    }
}

impl PageTableValidator for RiscvPlatform {
    fn init_and_validate(
        &self,
        levels: usize,
        root: usize,
        base: usize,
        size: usize,
    ) -> Result<(), PageTableError> {
        self.tables.init_and_validate(levels, root, base, size)
    }
}

impl HostMemory for RiscvPlatform {
    fn check_word(&self, addr: usize) -> Result<(), HostMemoryError> {
        if addr % core::mem::size_of::<usize>() != 0 {
            return Err(HostMemoryError::Misaligned);
        }
        if addr == 0 || touches_monitor(addr, core::mem::size_of::<usize>()) {
            return Err(HostMemoryError::Inaccessible);
        }
        Ok(())
    }

    fn write_word(&self, addr: usize, value: usize) -> Result<(), HostMemoryError> {
        self.check_word(addr)?;
        // SAFETY: machine mode writes physical memory directly, the address is outside of the
        // monitor and was checked against every enclave by the caller.
        unsafe { ptr::write_volatile(addr as *mut usize, value) };
        Ok(())
    }

    fn scrub(&self, base: usize, size: usize) {
        // SAFETY: the range is the memory of an enclave being destroyed, nobody can access it.
        unsafe { ptr::write_bytes(base as *mut u8, 0, size) };
    }
}
