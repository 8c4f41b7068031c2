//! Physical memory protection regions, and the guard keeping enclaves disjoint.

use crate::eid::EidAllocator;
use crate::enclave::EnclaveTable;
use crate::utils::ranges_intersect;
use crate::EnclaveId;

/// Handle of a protection region owned by the region driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionId(pub usize);

/// Placement of a region among the protection entries, lower entries take precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionPriority {
    Any,
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionError {
    /// No protection entry left.
    Exhausted,
    /// The range can not be expressed, or collides with monitor memory.
    InvalidRange,
    InvalidRegion,
}

/// Physical memory protection as seen by the engine.
///
/// "Global" operations apply to every hart and return once all of them applied the change,
/// "local" operations only touch the calling hart.
pub trait RegionDriver {
    /// Reserves a region with the given permissions, it is not enforced until set.
    fn init_atomic(
        &self,
        base: usize,
        size: usize,
        perm: u8,
        priority: RegionPriority,
    ) -> Result<RegionId, RegionError>;

    fn free_atomic(&self, region: RegionId);

    fn set_global(&self, hart: usize, region: RegionId) -> Result<(), RegionError>;

    fn unset_global(&self, hart: usize, region: RegionId) -> Result<(), RegionError>;

    /// Enforces the region on `hart`.
    fn set(&self, hart: usize, region: RegionId);

    /// Lifts the region on `hart`.
    fn unset(&self, hart: usize, region: RegionId);

    fn base(&self, region: RegionId) -> usize;

    fn size(&self, region: RegionId) -> usize;
}

/// Returns an allocated enclave whose memory intersects `[base, base + size)`.
///
/// Must be called with the enclave table lock held, `table` being the guarded table.
pub(crate) fn find_overlap<R: RegionDriver + ?Sized, S>(
    driver: &R,
    table: &EnclaveTable<S>,
    eids: &EidAllocator,
    base: usize,
    size: usize,
) -> Option<EnclaveId> {
    eids.allocated().find(|&eid| match table.enclaves[eid].region {
        Some(region) => ranges_intersect(base, size, driver.base(region), driver.size(region)),
        None => false,
    })
}
