//! Enclave id allocation.

use core::sync::atomic::{AtomicU64, Ordering};

use spin::MutexGuard;

use crate::config::ENCL_MAX;
use crate::enclave::EnclaveTable;
use crate::utils::BitmapIterator;
use crate::EnclaveId;

const _: () = assert!(ENCL_MAX <= 64);

/// Bitmap of the enclave ids in use.
///
/// Allocation and release require the guard of the lock protecting the enclave table, which
/// keeps them ordered with the table updates. Queries are lock free and may observe a slightly
/// stale bitmap.
pub struct EidAllocator {
    bitmap: AtomicU64,
}

impl EidAllocator {
    pub const fn new() -> Self {
        EidAllocator {
            bitmap: AtomicU64::new(0),
        }
    }

    /// Reserves the lowest free id.
    pub(crate) fn allocate<S>(
        &self,
        _table: &MutexGuard<'_, EnclaveTable<S>>,
    ) -> Option<EnclaveId> {
        let bitmap = self.bitmap.load(Ordering::Acquire);
        let eid = (!bitmap).trailing_zeros() as usize;
        if eid >= ENCL_MAX {
            return None;
        }
        self.bitmap.store(bitmap | (1 << eid), Ordering::Release);
        Some(eid)
    }

    pub(crate) fn free<S>(&self, _table: &MutexGuard<'_, EnclaveTable<S>>, eid: EnclaveId) {
        if eid < ENCL_MAX {
            self.bitmap.fetch_and(!(1 << eid), Ordering::AcqRel);
        }
    }

    pub fn is_allocated(&self, eid: EnclaveId) -> bool {
        eid < ENCL_MAX && self.bitmap.load(Ordering::Acquire) & (1 << eid) != 0
    }

    pub fn allocated(&self) -> BitmapIterator {
        BitmapIterator::new(self.bitmap.load(Ordering::Acquire))
    }
}

impl Default for EidAllocator {
    fn default() -> Self {
        Self::new()
    }
}

// ————————————————————————————————— Tests —————————————————————————————————— //
