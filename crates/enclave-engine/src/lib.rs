#![cfg_attr(not(any(test, feature = "mock")), no_std)]

//! Enclave lifecycle engine of the security monitor.
//!
//! The engine keeps a fixed table of enclaves, protected by a single lock, and drives the
//! platform through the traits of [`platform`] and [`region`]: physical memory protection, page
//! table validation, host memory and the CSRs of the calling hart. It does not know about SBI or
//! trap handling, the monitor decodes calls and forwards them here.

mod eid;
mod enclave;
mod error;
mod host;
mod lifecycle;
pub mod platform;
pub mod region;
mod satp;
mod switch;
pub mod utils;

#[cfg(any(test, feature = "mock"))]
pub mod mock;
#[cfg(test)]
mod tests;

pub use eid::EidAllocator;
pub use enclave::{EnclaveState, Location};
pub use error::{EnclaveError, StopReason, StopSignal};
pub use host::HostWrite;
pub use platform::{Hart, HostMemory, HostMemoryError, PageTableError, PageTableValidator, Platform};
pub use region::{RegionDriver, RegionError, RegionId, RegionPriority};
pub use satp::{LinearSatpIndex, SatpIndex};

use enclave::EnclaveTable;
use spin::Mutex;

/// Configuration for the static enclave engine size and the enclave address space layout.
pub mod config {
    pub const ENCL_MAX: usize = 16; // NOTE: Can't be greater than 64 as we use 64 bits bitmaps.
    pub const MAX_ENCL_THREADS: usize = 1;
    pub const NB_HARTS: usize = riscv_utils::NUM_HARTS;

    /// Virtual address of the enclave runtime, entry points must lie below it.
    pub const RUNTIME_START_ADDRESS: usize = 0xffff_ffff_2000_0000;
    /// Trap vector of the enclave runtime.
    pub const RUNTIME_TRAP_VECTOR: usize = RUNTIME_START_ADDRESS + 0x40;

    /// Enclave page tables are Sv39.
    pub const PAGE_TABLE_LEVELS: usize = 3;

    /// Value written instead of a result when the host points into enclave memory.
    pub const POISON_WORD: usize = usize::MAX;
}

/// Small integer naming an enclave, an index in the enclave table.
pub type EnclaveId = usize;

pub struct EnclaveEngine<P, S = LinearSatpIndex> {
    eids: EidAllocator,
    table: Mutex<EnclaveTable<S>>,
    platform: P,
}

impl<P: Platform, S: SatpIndex> EnclaveEngine<P, S> {
    pub const fn new(platform: P) -> Self {
        EnclaveEngine {
            eids: EidAllocator::new(),
            table: Mutex::new(EnclaveTable::new()),
            platform,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn is_allocated(&self, eid: EnclaveId) -> bool {
        self.eids.is_allocated(eid)
    }

    /// Returns the state of an allocated enclave.
    pub fn state(&self, eid: EnclaveId) -> Option<EnclaveState> {
        let table = self.table.lock();
        if !self.eids.is_allocated(eid) {
            return None;
        }
        Some(table.enclaves[eid].state)
    }

    /// Returns where the (single) thread of an enclave currently is.
    pub fn location(&self, eid: EnclaveId) -> Option<Location> {
        let table = self.table.lock();
        if !self.eids.is_allocated(eid) {
            return None;
        }
        Some(table.enclaves[eid].threads[0].location)
    }

    /// Page table root the host had when it created the enclave.
    pub fn host_satp(&self, eid: EnclaveId) -> Option<usize> {
        let table = self.table.lock();
        if !self.eids.is_allocated(eid) {
            return None;
        }
        Some(table.enclaves[eid].host_satp)
    }

    /// Returns the first enclave created under the given host page table root.
    pub fn lookup_by_host_satp(&self, host_satp: usize) -> Option<EnclaveId> {
        let table = self.table.lock();
        table.index.lookup_by_host_satp(&table.enclaves, host_satp)
    }

    /// Returns the enclave whose page table root is `encl_satp`.
    pub fn lookup_by_enclave_satp(&self, encl_satp: usize) -> Option<EnclaveId> {
        let table = self.table.lock();
        table.index.lookup_by_enclave_satp(&table.enclaves, encl_satp)
    }

    /// Physical range `(base, size)` of an enclave.
    pub fn region_bounds(&self, eid: EnclaveId) -> Option<(usize, usize)> {
        let table = self.table.lock();
        if !self.eids.is_allocated(eid) {
            return None;
        }
        let region = table.enclaves[eid].region?;
        Some((self.platform.base(region), self.platform.size(region)))
    }
}
