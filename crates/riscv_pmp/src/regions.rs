//! PMP region bookkeeping shared by all harts.
//!
//! A region owns one (NAPOT) or two (TOR) consecutive entries. Once a region is made global its
//! entries are programmed on every online hart, except on the harts that explicitly lifted it.
//! Harts learn about global changes through a generation counter: the hart performing the change
//! bumps the generation, notifies the other online harts, and waits until each of them has
//! re-synchronized its local entries.

use core::sync::atomic::{AtomicUsize, Ordering};

use riscv_utils::NUM_HARTS;
use spin::Mutex;

use crate::{pmp_cfg, pmp_encode, PMPErrorCode, PmpEncoding, FROZEN_PMP_ENTRIES, PMP_ENTRIES};

/// Where a new region should land in the PMP entries. Lower entries take precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionPriority {
    /// Any free entries.
    Any,
    /// The first non-frozen entries.
    Top,
    /// The last entries.
    Bottom,
}

/// Hardware access used by [`PmpRegions`].
pub trait PmpBackend {
    /// Programs entry `index` on `hart`. Only ever called from `hart` itself.
    fn write_entry(&self, hart: usize, index: usize, pmpaddr: usize, cfg: u8);

    /// Asks every hart in the `harts` mask to call [`PmpRegions::sync_local`].
    fn notify(&self, harts: usize);
}

#[derive(Debug, Clone, Copy)]
struct Region {
    base: usize,
    size: usize,
    perm: u8,
    encoding: PmpEncoding,
    index: usize,
    global: bool,
    /// Harts on which the region is currently not enforced.
    lifted: usize,
}

impl Region {
    fn enforced_on(&self, hart: usize) -> bool {
        self.global && self.lifted & (1 << hart) == 0
    }
}

struct RegionTable {
    regions: [Option<Region>; PMP_ENTRIES],
    /// Bitmap of reserved PMP entries.
    used_entries: usize,
}

pub struct PmpRegions<B> {
    table: Mutex<RegionTable>,
    backend: B,
    generation: AtomicUsize,
    seen: [AtomicUsize; NUM_HARTS],
    online: AtomicUsize,
}

const ZERO: AtomicUsize = AtomicUsize::new(0);

impl<B: PmpBackend> PmpRegions<B> {
    pub const fn new(backend: B) -> Self {
        PmpRegions {
            table: Mutex::new(RegionTable {
                regions: [None; PMP_ENTRIES],
                used_entries: (1 << FROZEN_PMP_ENTRIES) - 1,
            }),
            backend,
            generation: AtomicUsize::new(0),
            seen: [ZERO; NUM_HARTS],
            online: AtomicUsize::new(0),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Registers a hart as taking part in global updates, and brings its entries up to date.
    pub fn hart_online(&self, hart: usize) {
        self.online.fetch_or(1 << hart, Ordering::SeqCst);
        self.sync_local(hart);
    }

    /// Reserves entries for `[base, base + size)` with permissions `perm`. The region is not
    /// enforced anywhere until it is set.
    pub fn init_region(
        &self,
        base: usize,
        size: usize,
        perm: u8,
        priority: RegionPriority,
    ) -> Result<usize, PMPErrorCode> {
        let encoding = pmp_encode(base, size)?;
        pmp_cfg(encoding.mode(), perm)?;

        let mut table = self.table.lock();
        let index = find_entries(table.used_entries, encoding.entries(), priority)
            .ok_or(PMPErrorCode::NoFreeEntry)?;
        let mask = ((1 << encoding.entries()) - 1) << index;
        table.used_entries |= mask;
        table.regions[index] = Some(Region {
            base,
            size,
            perm,
            encoding,
            index,
            global: false,
            lifted: 0,
        });
        log::trace!(
            "PMP region {} at {:#x} size {:#x} perm {:x} uses {} entries",
            index,
            base,
            size,
            perm,
            encoding.entries()
        );
        Ok(index)
    }

    /// Releases the region's entries. The region must not be enforced on any hart anymore.
    pub fn free_region(&self, region: usize) -> Result<(), PMPErrorCode> {
        let mut table = self.table.lock();
        let entry = table
            .regions
            .get_mut(region)
            .and_then(|slot| slot.take())
            .ok_or(PMPErrorCode::InvalidIndex)?;
        let mask = ((1 << entry.encoding.entries()) - 1) << entry.index;
        table.used_entries &= !mask;
        Ok(())
    }

    pub fn region_bounds(&self, region: usize) -> Option<(usize, usize)> {
        let table = self.table.lock();
        table
            .regions
            .get(region)
            .copied()
            .flatten()
            .map(|r| (r.base, r.size))
    }

    /// Enforces the region on every online hart, returns once all of them applied it.
    pub fn set_global(&self, hart: usize, region: usize) -> Result<(), PMPErrorCode> {
        self.update_global(hart, region, true)
    }

    /// Stops enforcing the region on every online hart, returns once all of them applied it.
    pub fn unset_global(&self, hart: usize, region: usize) -> Result<(), PMPErrorCode> {
        self.update_global(hart, region, false)
    }

    /// Enforces a global region on `hart` again.
    pub fn set_local(&self, hart: usize, region: usize) -> Result<(), PMPErrorCode> {
        let mut table = self.table.lock();
        let entry = region_mut(&mut table, region)?;
        entry.lifted &= !(1 << hart);
        let entry = *entry;
        drop(table);
        self.program(hart, &entry);
        Ok(())
    }

    /// Lifts a global region on `hart` only.
    pub fn unset_local(&self, hart: usize, region: usize) -> Result<(), PMPErrorCode> {
        let mut table = self.table.lock();
        let entry = region_mut(&mut table, region)?;
        entry.lifted |= 1 << hart;
        let entry = *entry;
        drop(table);
        self.program(hart, &entry);
        Ok(())
    }

    /// Re-programs every entry of `hart` from the shared table.
    pub fn sync_local(&self, hart: usize) {
        let table = self.table.lock();
        let generation = self.generation.load(Ordering::SeqCst);
        for index in FROZEN_PMP_ENTRIES..PMP_ENTRIES {
            if table.used_entries & (1 << index) == 0 {
                self.backend.write_entry(hart, index, 0, 0);
            } else if let Some(region) = table.regions[index] {
                self.program(hart, &region);
            }
        }
        drop(table);
        self.seen[hart].fetch_max(generation, Ordering::SeqCst);
    }

    /// Re-synchronizes `hart` if a global update happened since its last synchronization.
    pub fn sync_if_stale(&self, hart: usize) {
        if self.seen[hart].load(Ordering::SeqCst) < self.generation.load(Ordering::SeqCst) {
            self.sync_local(hart);
        }
    }

    fn update_global(&self, hart: usize, region: usize, global: bool) -> Result<(), PMPErrorCode> {
        let mut table = self.table.lock();
        let entry = region_mut(&mut table, region)?;
        entry.global = global;
        entry.lifted = 0;
        let entry = *entry;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        drop(table);

        self.program(hart, &entry);
        self.seen[hart].fetch_max(generation, Ordering::SeqCst);

        let others = self.online.load(Ordering::SeqCst) & !(1 << hart);
        if others == 0 {
            return Ok(());
        }
        self.backend.notify(others);
        for other in BitIter(others) {
            while self.seen[other].load(Ordering::SeqCst) < generation {
                // Another hart may be waiting on us at the same time.
                self.sync_local(hart);
                core::hint::spin_loop();
            }
        }
        Ok(())
    }

    fn program(&self, hart: usize, region: &Region) {
        let cfg = if region.enforced_on(hart) {
            // Permissions were validated when the region was created.
            pmp_cfg(region.encoding.mode(), region.perm).unwrap_or(0)
        } else {
            0
        };
        match region.encoding {
            PmpEncoding::Napot { pmpaddr } => {
                self.backend.write_entry(hart, region.index, pmpaddr, cfg)
            }
            PmpEncoding::Tor { bottom, top } => {
                self.backend.write_entry(hart, region.index, bottom, 0);
                self.backend.write_entry(hart, region.index + 1, top, cfg);
            }
        }
    }
}

fn region_mut(table: &mut RegionTable, region: usize) -> Result<&mut Region, PMPErrorCode> {
    table
        .regions
        .get_mut(region)
        .and_then(|slot| slot.as_mut())
        .ok_or(PMPErrorCode::InvalidIndex)
}

/// Returns the first index of `count` consecutive free entries.
fn find_entries(used: usize, count: usize, priority: RegionPriority) -> Option<usize> {
    let mask = (1 << count) - 1;
    let is_free = |index: usize| index + count <= PMP_ENTRIES && used & (mask << index) == 0;
    match priority {
        RegionPriority::Top => Some(FROZEN_PMP_ENTRIES).filter(|&index| is_free(index)),
        RegionPriority::Bottom => Some(PMP_ENTRIES - count).filter(|&index| is_free(index)),
        RegionPriority::Any => (FROZEN_PMP_ENTRIES..PMP_ENTRIES).find(|&index| is_free(index)),
    }
}

struct BitIter(usize);

impl Iterator for BitIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.0 == 0 {
            return None;
        }
        let bit = self.0.trailing_zeros() as usize;
        self.0 &= self.0 - 1;
        Some(bit)
    }
}

// ————————————————————————————————— Tests —————————————————————————————————— //
