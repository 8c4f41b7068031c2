//! Enclave creation and destruction.

use riscv_csrs::satp;
use riscv_utils::PAGE_SIZE;

use crate::config::PAGE_TABLE_LEVELS;
use crate::enclave::{Enclave, EnclaveState};
use crate::platform::{Hart, Platform};
use crate::region::{find_overlap, RegionId, RegionPriority};
use crate::satp::SatpIndex;
use crate::{EnclaveEngine, EnclaveError, EnclaveId};

/// Enclave memory is not accessible from supervisor or user mode.
const NO_PERMISSIONS: u8 = 0;

/// Resources held by a creation in progress, released in reverse order when dropped.
struct Claim<'a, P: Platform, S: SatpIndex> {
    engine: &'a EnclaveEngine<P, S>,
    hart: usize,
    region: RegionId,
    eid: Option<EnclaveId>,
    enforced: bool,
}

impl<'a, P: Platform, S: SatpIndex> Claim<'a, P, S> {
    /// Keeps every resource, the enclave now owns them.
    fn commit(self) {
        core::mem::forget(self);
    }
}

impl<'a, P: Platform, S: SatpIndex> Drop for Claim<'a, P, S> {
    fn drop(&mut self) {
        let engine = self.engine;
        if self.enforced {
            if let Err(err) = engine.platform.unset_global(self.hart, self.region) {
                log::error!("Failed to lift region {:?} while unwinding: {:?}", self.region, err);
            }
        }
        if let Some(eid) = self.eid.take() {
            let mut table = engine.table.lock();
            table.enclaves[eid] = Enclave::EMPTY;
            engine.eids.free(&table, eid);
        }
        engine.platform.free_atomic(self.region);
    }
}

impl<P: Platform, S: SatpIndex> EnclaveEngine<P, S> {
    /// Creates an enclave out of the physical range `[base, base + size)`.
    ///
    /// The range must hold the enclave page table at `base`. On success the new id is also
    /// written at host address `eid_ptr`.
    pub fn create<H: Hart>(
        &self,
        hart: &H,
        base: usize,
        size: usize,
        eid_ptr: usize,
    ) -> Result<EnclaveId, EnclaveError> {
        if size == 0 || base % PAGE_SIZE != 0 || base.checked_add(size).is_none() {
            log::debug!("Invalid enclave range {:#x} + {:#x}", base, size);
            return Err(EnclaveError::IllegalArgument);
        }
        if let Err(err) = self.platform.check_word(eid_ptr) {
            log::debug!("Can not deliver the enclave id at {:#x}: {:?}", eid_ptr, err);
            return Err(EnclaveError::IllegalArgument);
        }

        let region = self
            .platform
            .init_atomic(base, size, NO_PERMISSIONS, RegionPriority::Any)
            .map_err(|err| {
                log::warn!("No PMP region for enclave at {:#x}: {:?}", base, err);
                EnclaveError::PmpFailure
            })?;
        let mut claim = Claim {
            engine: self,
            hart: hart.id(),
            region,
            eid: None,
            enforced: false,
        };

        let eid = {
            let mut table = self.table.lock();
            if let Some(other) = find_overlap(&self.platform, &*table, &self.eids, base, size) {
                log::warn!("Region {:#x} + {:#x} overlaps enclave {}", base, size, other);
                return Err(EnclaveError::RegionOverlap);
            }
            let eid = self.eids.allocate(&table).ok_or_else(|| {
                log::warn!("Enclave table is full");
                EnclaveError::NoCapacity
            })?;
            let enclave = &mut table.enclaves[eid];
            *enclave = Enclave::EMPTY;
            enclave.eid = eid;
            enclave.region = Some(region);
            enclave.state = EnclaveState::Allocated;
            eid
        };
        claim.eid = Some(eid);

        self.platform
            .set_global(hart.id(), region)
            .map_err(|err| {
                log::warn!("Failed to enforce region of enclave {}: {:?}", eid, err);
                EnclaveError::PmpFailure
            })?;
        claim.enforced = true;

        self.platform
            .init_and_validate(PAGE_TABLE_LEVELS, base, base, size)
            .map_err(|err| {
                log::warn!("Enclave {} page table rejected: {:?}", eid, err);
                EnclaveError::IllegalPageTable
            })?;

        {
            let mut table = self.table.lock();
            let enclave = &mut table.enclaves[eid];
            enclave.host_satp = hart.satp();
            enclave.encl_satp = satp::sv39(base);
            enclave.n_thread = 0;
            enclave.state = EnclaveState::Initialized;
            let (encl_satp, host_satp) = (enclave.encl_satp, enclave.host_satp);
            table.index.record(eid, encl_satp, host_satp);
        }
        claim.commit();
        log::info!("Created enclave {} at {:#x} + {:#x}", eid, base, size);

        self.write_word_to_host(eid_ptr, eid);
        Ok(eid)
    }

    /// Destroys an enclave that is not running and scrubs its memory.
    pub fn destroy<H: Hart>(&self, hart: &H, eid: EnclaveId) -> Result<(), EnclaveError> {
        let region = {
            let mut table = self.table.lock();
            let destroyable = self.eids.is_allocated(eid) && table.enclaves[eid].is_destroyable();
            if !destroyable {
                log::debug!("Enclave {} is not destroyable", eid);
                return Err(EnclaveError::NotDestroyable);
            }
            let enclave = &mut table.enclaves[eid];
            let region = enclave.region.ok_or(EnclaveError::UnknownError)?;
            enclave.state = EnclaveState::Destroyed;
            region
        };

        let (base, size) = (self.platform.base(region), self.platform.size(region));
        self.platform.scrub(base, size);
        if let Err(err) = self.platform.unset_global(hart.id(), region) {
            log::error!("Failed to lift region of enclave {}: {:?}", eid, err);
        }

        // The driver recycles region ids, the slot must not name this one once it is freed.
        {
            let mut table = self.table.lock();
            table.enclaves[eid].region = None;
            table.index.forget(eid);
        }
        self.platform.free_atomic(region);

        let mut table = self.table.lock();
        table.enclaves[eid].clear();
        self.eids.free(&table, eid);
        log::info!("Destroyed enclave {}", eid);
        Ok(())
    }
}
